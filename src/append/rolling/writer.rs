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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use anyhow::Context;

use crate::append::rolling::clock::WallClock;
use crate::append::rolling::lock::LockFile;
use crate::append::rolling::RotationLogic;
use crate::Error;

/// The writer side of a rotating file sink.
///
/// Holds the open append handle, the sibling `.lock` advisory lock, and the
/// rotation schedule. Every write runs the full cross-process protocol: OS
/// lock, re-stat, trigger evaluation, rollover, append, retention sweep,
/// unlock. The caller (the [`RollingFile`][super::RollingFile] sink)
/// serializes access with its own in-process mutex.
#[derive(Debug)]
pub(crate) struct RollingFileWriter {
    state: State,
    file: Option<File>,
    lock: LockFile,
}

#[derive(Debug)]
struct State {
    base_path: PathBuf,
    logic: Option<RotationLogic>,
    next_rollover_ms: Option<i64>,
    clock: WallClock,
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn apply_suffixes(file_name: &str, logic: Option<&RotationLogic>, clock: &WallClock) -> String {
    let Some(logic) = logic else {
        return file_name.to_string();
    };
    let mut name = file_name.to_string();
    if logic.append_filename_pid() {
        name = insert_before_extension(&name, &format!(".{}", std::process::id()));
    }
    if logic.append_filename_timestamp() {
        let stamp = clock.current().strftime("%Y%m%d_%H%M%S").to_string();
        name = insert_before_extension(&name, &format!("_{stamp}"));
    }
    name
}

fn insert_before_extension(file_name: &str, suffix: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}{}", &file_name[..dot], suffix, &file_name[dot..]),
        _ => format!("{file_name}{suffix}"),
    }
}

impl RollingFileWriter {
    /// Opens (or creates) the target file under `dir`, which must be an
    /// absolute path. The directory is created if missing.
    pub(crate) fn open(
        dir: &Path,
        file_name: &str,
        logic: Option<RotationLogic>,
        clock: WallClock,
    ) -> Result<RollingFileWriter, Error> {
        if !dir.is_absolute() {
            return Err(Error::invalid_config(format!(
                "log_dir must be an absolute path, got {}",
                dir.display()
            )));
        }
        fs::create_dir_all(dir)?;

        let file_name = apply_suffixes(file_name, logic.as_ref(), &clock);
        let base_path = dir.join(&file_name);
        let lock = LockFile::open(&base_path.with_file_name(format!("{file_name}.lock")))?;

        let now = clock.current();
        let mut next_rollover_ms = logic.as_ref().and_then(|logic| logic.next_rollover(&now));

        // an active file left behind by a previous run that is older than one
        // full period behind the schedule must not absorb a fresh period
        if let (Some(next), Some(period)) = (
            next_rollover_ms,
            logic.as_ref().and_then(|logic| logic.period_seconds()),
        ) {
            if let Ok(modified) = fs::metadata(&base_path).and_then(|meta| meta.modified()) {
                if let Ok(timestamp) = jiff::Timestamp::try_from(modified) {
                    if timestamp.as_millisecond() < next - (period as i64) * 1_000 {
                        next_rollover_ms = Some(0);
                    }
                }
            }
        }

        let file = open_append(&base_path).map_err(|err| match err.downcast::<std::io::Error>() {
            Ok(io) => Error::Io(io),
            Err(err) => Error::invalid_config(err.to_string()),
        })?;

        Ok(RollingFileWriter {
            state: State {
                base_path,
                logic,
                next_rollover_ms,
                clock,
            },
            file: Some(file),
            lock,
        })
    }

    /// The resolved path of the active file, after suffix rules.
    pub(crate) fn path(&self) -> &Path {
        &self.state.base_path
    }

    /// Appends one rendered record, rotating first if a trigger fires.
    pub(crate) fn write(&mut self, buf: &[u8]) -> anyhow::Result<()> {
        self.lock
            .acquire()
            .context("failed to acquire advisory lock")?;
        let result = self.write_locked(buf);
        if let Err(err) = self.lock.release() {
            eprintln!(
                "logward: failed to release advisory lock for {}: {err}",
                self.state.base_path.display()
            );
        }
        result
    }

    fn write_locked(&mut self, buf: &[u8]) -> anyhow::Result<()> {
        self.reopen_if_rotated()?;

        let rotated = if self.should_rollover(buf.len() as u64)? {
            self.rollover()?;
            true
        } else {
            false
        };

        let file = self.file.as_mut().expect("active file is open");
        file.write_all(buf)
            .with_context(|| format!("failed to append to {}", self.state.base_path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.state.base_path.display()))?;

        if rotated {
            self.state.sweep_expired();
        }
        Ok(())
    }

    /// Another process may have rotated the base path while we were not
    /// holding the lock; if so the handle points at a rotated file and the
    /// base path must be reopened.
    fn reopen_if_rotated(&mut self) -> anyhow::Result<()> {
        let stale = match (&self.file, fs::metadata(&self.state.base_path)) {
            (None, _) => true,
            (Some(_), Err(_)) => true,
            (Some(file), Ok(on_disk)) => {
                let ours = file.metadata().context("failed to stat active file")?;
                !same_file(&ours, &on_disk)
            }
        };
        if stale {
            self.file = Some(open_append(&self.state.base_path)?);
        }
        Ok(())
    }

    fn should_rollover(&mut self, incoming: u64) -> anyhow::Result<bool> {
        if let Some(max_bytes) = self.state.logic.as_ref().and_then(|logic| logic.max_bytes())
        {
            let file = self.file.as_ref().expect("active file is open");
            let size = file
                .metadata()
                .context("failed to stat active file")?
                .len();
            if size + incoming > max_bytes {
                return Ok(true);
            }
        }
        if let Some(next) = self.state.next_rollover_ms {
            let now = self.state.clock.current().timestamp().as_millisecond();
            if now >= next {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn rollover(&mut self) -> anyhow::Result<()> {
        // the handle must be closed before the rename and reopened after
        self.file = None;

        let backup_count = self
            .state
            .logic
            .as_ref()
            .map(|logic| logic.backup_count())
            .unwrap_or(0);
        if backup_count > 0 {
            for i in (1..backup_count).rev() {
                let source = self.state.indexed(i);
                let target = self.state.indexed(i + 1);
                if source.exists() {
                    if target.exists() {
                        fs::remove_file(&target).with_context(|| {
                            format!("failed to delete backup {}", target.display())
                        })?;
                    }
                    fs::rename(&source, &target).with_context(|| {
                        format!("failed to rotate backup {}", source.display())
                    })?;
                }
            }
            let first = self.state.indexed(1);
            if first.exists() {
                fs::remove_file(&first)
                    .with_context(|| format!("failed to delete backup {}", first.display()))?;
            }
            if self.state.base_path.exists() {
                fs::rename(&self.state.base_path, &first).with_context(|| {
                    format!("failed to rotate {}", self.state.base_path.display())
                })?;
            }
        }

        self.file = Some(open_append(&self.state.base_path)?);

        self.state.next_rollover_ms = self
            .state
            .logic
            .as_ref()
            .and_then(|logic| logic.next_rollover(&self.state.clock.current()));
        Ok(())
    }

    /// Flushes the active handle.
    pub(crate) fn flush(&mut self) -> anyhow::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()
                .with_context(|| format!("failed to flush {}", self.state.base_path.display()))?;
        }
        Ok(())
    }

    /// Flushes and drops the handle. The lock file persists.
    pub(crate) fn close(&mut self) {
        if let Err(err) = self.flush() {
            eprintln!(
                "logward: failed to flush {} on close: {err:#}",
                self.state.base_path.display()
            );
        }
        self.file = None;
    }

    #[cfg(test)]
    fn advance_clock(&mut self, span: jiff::Span) {
        self.state.clock.advance(span);
    }
}

fn same_file(ours: &fs::Metadata, on_disk: &fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        ours.ino() == on_disk.ino() && ours.dev() == on_disk.dev()
    }
    #[cfg(not(unix))]
    {
        // without a stable identity, a shrunken on-disk file means someone
        // rotated it underneath us
        on_disk.len() >= ours.len()
    }
}

impl State {
    fn indexed(&self, i: u32) -> PathBuf {
        let name = self
            .base_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.base_path.with_file_name(format!("{name}.{i}"))
    }

    /// Deletes rotated siblings older than the expiration rule. Failures to
    /// delete are ignored; the next sweep retries.
    fn sweep_expired(&self) {
        let Some(rule) = self.logic.as_ref().and_then(|logic| logic.expiration_rule()) else {
            return;
        };
        let cutoff = SystemTime::now() - Duration::from_secs(rule.max_age_seconds());
        for path in self.rotated_files() {
            let expired = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if expired {
                let _ = fs::remove_file(&path);
            }
        }
    }

    /// The rotated siblings of the active file: `<name>.<digits>`.
    fn rotated_files(&self) -> Vec<PathBuf> {
        let Some(dir) = self.base_path.parent() else {
            return Vec::new();
        };
        let Some(base_name) = self.base_path.file_name().and_then(|name| name.to_str()) else {
            return Vec::new();
        };
        let prefix = format!("{base_name}.");

        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let file_name = entry.file_name();
                let file_name = file_name.to_str()?;
                let index = file_name.strip_prefix(&prefix)?;
                if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                    Some(entry.path())
                } else {
                    None
                }
            })
            .collect()
    }
}
