// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The global audit fan-out.
//!
//! While auditing is active, every record dispatched by any logger in the
//! process is additionally written to a single rotating audit file, each line
//! prefixed with the source logger's name. A logger's own sinks are never
//! affected; callers that need a global order across threads route through
//! the audit file, which serializes everything behind one sink.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::LazyLock;

use parking_lot::Mutex;

use crate::append::rolling::RotationLogic;
use crate::append::Append;
use crate::append::RollingFile;
use crate::layout::AuditLayout;
use crate::layout::RecordDetails;
use crate::record::Record;
use crate::Error;

static AUDIT_ACTIVE: AtomicBool = AtomicBool::new(false);
static AUDIT_SINK: LazyLock<Mutex<Option<RollingFile>>> = LazyLock::new(|| Mutex::new(None));

/// Enable global auditing of every logger in the process.
///
/// Installs a rotating file sink at `<log_dir>/<file_name>` formatted by the
/// [`AuditLayout`] (which preserves ANSI) and flips the flag observed on
/// every dispatch path. Existing loggers need no reconfiguration. Starting
/// while already active replaces the previous audit sink.
pub fn audit_everything(
    log_dir: impl AsRef<Path>,
    file_name: &str,
    rotation: Option<RotationLogic>,
    details: Option<RecordDetails>,
) -> Result<(), Error> {
    let layout = AuditLayout::new(details.unwrap_or_default());
    let sink = RollingFile::open(log_dir.as_ref(), file_name, layout, rotation, true)?;

    let mut slot = AUDIT_SINK.lock();
    if let Some(previous) = slot.take() {
        previous.close();
    }
    *slot = Some(sink);
    AUDIT_ACTIVE.store(true, Ordering::Release);
    Ok(())
}

/// Disable global auditing: flush and close the audit sink and clear the
/// flag. Safe to call when auditing is not active.
pub fn terminate_auditing() {
    AUDIT_ACTIVE.store(false, Ordering::Release);
    let mut slot = AUDIT_SINK.lock();
    if let Some(sink) = slot.take() {
        sink.close();
    }
}

/// Whether global auditing is currently active.
pub fn auditing() -> bool {
    AUDIT_ACTIVE.load(Ordering::Acquire)
}

/// Offer a dispatched record to the audit sink. Called from every logger's
/// dispatch path; a cheap atomic check when auditing is inactive.
pub(crate) fn dispatch(record: &Record) {
    if !AUDIT_ACTIVE.load(Ordering::Acquire) {
        return;
    }
    let slot = AUDIT_SINK.lock();
    if let Some(sink) = slot.as_ref() {
        if let Err(err) = sink.append(record) {
            eprintln!(
                "logward: failed to write to audit sink {}: {err:#}",
                sink.path().display()
            );
        }
    }
}
