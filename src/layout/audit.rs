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

use crate::ansi;
use crate::layout::details::RecordDetails;
use crate::layout::structured::render;
use crate::layout::Layout;
use crate::record::Record;

/// The layout used by the global audit sink.
///
/// Wraps a plain rendering with a `[<logger-name>]: ` prefix so every line in
/// the audit file names its source logger. ANSI sequences in the message are
/// preserved unless [`AuditLayout::strip_ansi`] is enabled. The details are
/// the audit sink's own and are independent of any source logger's
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct AuditLayout {
    details: RecordDetails,
    strip_ansi: bool,
}

impl AuditLayout {
    /// Create an audit layout with the given details.
    pub fn new(details: RecordDetails) -> AuditLayout {
        AuditLayout {
            details,
            strip_ansi: false,
        }
    }

    /// Strip ANSI sequences from audit lines instead of preserving them.
    #[must_use]
    pub fn strip_ansi(mut self, enabled: bool) -> Self {
        self.strip_ansi = enabled;
        self
    }
}

impl Layout for AuditLayout {
    fn format(&self, record: &Record) -> Vec<u8> {
        let line = render(record, &self.details, false);
        let line = if self.strip_ansi {
            ansi::strip(&line)
        } else {
            line
        };
        format!("[{}]: {}", record.logger_name(), line).into_bytes()
    }
}
