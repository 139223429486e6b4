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

//! Named loggers, their sinks, and the emission path.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;

use crate::append::Append;
use crate::append::Console;
use crate::append::RollingFile;
use crate::append::rolling::RotationLogic;
use crate::audit;
use crate::layout::PlainLayout;
use crate::layout::RecordDetails;
use crate::level::level_registry;
use crate::level::Severity;
use crate::record::render_error_chain;
use crate::record::CallSite;
use crate::record::FieldValue;
use crate::record::Record;
use crate::Error;

mod registry;

pub use self::registry::get;
pub use self::registry::get_with_severity;
pub use self::registry::initialize;
pub use self::registry::ROOT;

use self::registry::release_file_path;
use self::registry::reserve_file_path;
use self::registry::resolve_parent_severity;

/// Options for attaching a file sink to a logger.
#[derive(Debug, Default)]
pub struct FileOptions {
    file_name: Option<String>,
    details: Option<RecordDetails>,
    rotation: Option<RotationLogic>,
    preserve_ansi: bool,
}

impl FileOptions {
    /// Start with the defaults: `<logger>.log`, default details, no rotation,
    /// ANSI sanitized.
    #[must_use]
    pub fn new() -> FileOptions {
        FileOptions::default()
    }

    /// Override the file name (defaults to `<logger>.log`).
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the record details the sink formats with.
    #[must_use]
    pub fn details(mut self, details: RecordDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Enable rotation.
    #[must_use]
    pub fn rotation(mut self, rotation: RotationLogic) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Keep ANSI escape sequences in raw output instead of sanitizing them.
    #[must_use]
    pub fn preserve_ansi(mut self, enabled: bool) -> Self {
        self.preserve_ansi = enabled;
        self
    }
}

#[derive(Debug)]
struct FileSink {
    dir: PathBuf,
    file_name: String,
    sink: RollingFile,
}

#[derive(Debug, Default)]
struct SinkState {
    console: Option<Console>,
    files: Vec<FileSink>,
    retired: bool,
}

/// A named logger.
///
/// Loggers are created through [`get`] and live in the process-wide registry
/// for the rest of the process, unless destroyed. Each logger owns at most
/// one console sink and any number of file sinks; records never propagate to
/// an ancestor's sinks. Severity is the logger's own, or inherited through
/// the dotted name chain while it is NOTSET.
#[derive(Debug)]
pub struct Logger {
    name: String,
    severity: AtomicU32,
    state: RwLock<SinkState>,
    last_record: Mutex<Option<Arc<Record>>>,
}

impl Logger {
    pub(crate) fn new(name: &str, severity: Severity) -> Logger {
        Logger {
            name: name.to_string(),
            severity: AtomicU32::new(severity.0),
            state: RwLock::new(SinkState::default()),
            last_record: Mutex::new(None),
        }
    }

    /// The logger's dotted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logger's explicit severity; NOTSET means inherited.
    pub fn severity(&self) -> Severity {
        Severity(self.severity.load(Ordering::Relaxed))
    }

    /// Set the logger's explicit severity; NOTSET restores inheritance.
    pub fn set_severity(&self, severity: Severity) {
        self.severity.store(severity.0, Ordering::Relaxed);
    }

    /// The severity the logger filters with: its own, or the nearest
    /// ancestor's, or the root's.
    pub fn effective_severity(&self) -> Severity {
        let explicit = self.severity();
        if explicit.is_notset() {
            resolve_parent_severity(&self.name)
        } else {
            explicit
        }
    }

    /// Whether a record at `severity` would be dispatched.
    pub fn enabled(&self, severity: Severity) -> bool {
        !self.retired() && severity >= self.effective_severity()
    }

    /// Whether the logger has been retired (or destroyed).
    pub fn retired(&self) -> bool {
        self.state.read().retired
    }

    // ------------------------------------------------------------------
    // sink management
    // ------------------------------------------------------------------

    /// Attach a console sink with default details.
    pub fn add_console(&self) -> Result<(), Error> {
        self.add_console_with(RecordDetails::default())
    }

    /// Attach a console sink. Each logger may have at most one.
    pub fn add_console_with(&self, details: RecordDetails) -> Result<(), Error> {
        let mut state = self.state.write();
        if state.retired {
            return Err(Error::lifecycle(format!(
                "logger {:?} has been retired and cannot accept sinks",
                self.name
            )));
        }
        if state.console.is_some() {
            return Err(Error::invalid_config(format!(
                "logger {:?} already has a console sink",
                self.name
            )));
        }
        state.console = Some(Console::new(details));
        Ok(())
    }

    /// Remove the console sink previously attached with
    /// [`Logger::add_console`].
    pub fn remove_console(&self) -> Result<(), Error> {
        let mut state = self.state.write();
        match state.console.take() {
            Some(console) => {
                console.close();
                Ok(())
            }
            None => Err(Error::invalid_config(format!(
                "logger {:?} has no console sink to remove",
                self.name
            ))),
        }
    }

    /// Attach a file sink under `log_dir`, which must be an absolute path.
    ///
    /// The directory is created if missing. A second sink on the same
    /// resolved path anywhere in the process is rejected.
    pub fn add_file(&self, log_dir: impl AsRef<Path>, options: FileOptions) -> Result<(), Error> {
        let log_dir = log_dir.as_ref();
        let file_name = options
            .file_name
            .unwrap_or_else(|| format!("{}.log", self.name));
        let details = options.details.unwrap_or_default();

        {
            let state = self.state.read();
            if state.retired {
                return Err(Error::lifecycle(format!(
                    "logger {:?} has been retired and cannot accept sinks",
                    self.name
                )));
            }
        }

        let sink = RollingFile::open(
            log_dir,
            &file_name,
            PlainLayout::new(details),
            options.rotation,
            options.preserve_ansi,
        )?;
        if let Err(err) = reserve_file_path(sink.path()) {
            sink.close();
            return Err(err);
        }

        let mut state = self.state.write();
        if state.retired {
            release_file_path(sink.path());
            sink.close();
            return Err(Error::lifecycle(format!(
                "logger {:?} has been retired and cannot accept sinks",
                self.name
            )));
        }
        state.files.push(FileSink {
            dir: log_dir.to_path_buf(),
            file_name,
            sink,
        });
        Ok(())
    }

    /// Remove the file sink identified by `(log_dir, file_name)`.
    pub fn remove_file(&self, log_dir: impl AsRef<Path>, file_name: &str) -> Result<(), Error> {
        let log_dir = log_dir.as_ref();
        let mut state = self.state.write();
        let position = state
            .files
            .iter()
            .position(|file| file.dir == log_dir && file.file_name == file_name);
        match position {
            Some(position) => {
                let file = state.files.remove(position);
                file.sink.close();
                release_file_path(file.sink.path());
                Ok(())
            }
            None => Err(Error::invalid_config(format!(
                "logger {:?} has no file sink for {}/{file_name}",
                self.name,
                log_dir.display()
            ))),
        }
    }

    /// The attached output targets: `console` and the resolved file paths, in
    /// attachment order.
    pub fn output_targets(&self) -> Vec<String> {
        let state = self.state.read();
        let mut targets = Vec::new();
        if state.console.is_some() {
            targets.push("console".to_string());
        }
        for file in &state.files {
            targets.push(file.sink.path().display().to_string());
        }
        targets
    }

    // ------------------------------------------------------------------
    // lifecycle
    // ------------------------------------------------------------------

    /// Flush and close all sinks and mark the logger retired.
    ///
    /// Subsequent emissions are silently dropped; the name stays reserved in
    /// the registry until [`Logger::destroy`]. Retiring twice is a no-op.
    pub fn retire(&self) {
        let mut state = self.state.write();
        if state.retired {
            return;
        }
        if let Some(console) = state.console.take() {
            console.close();
        }
        for file in state.files.drain(..) {
            file.sink.close();
            release_file_path(file.sink.path());
        }
        state.retired = true;
    }

    /// As [`Logger::retire`], plus removes the logger from the registry so a
    /// fresh logger can be created under the same name.
    pub fn destroy(&self) {
        self.retire();
        registry::remove(&self.name);
    }

    // ------------------------------------------------------------------
    // emission
    // ------------------------------------------------------------------

    /// Start building an event at `severity`.
    pub fn at(&self, severity: Severity) -> Event<'_> {
        Event {
            logger: self,
            severity,
            fields: Vec::new(),
            exception: None,
            with_stack: false,
            task_name: None,
            call_site: None,
        }
    }

    /// Emit a record at `severity`.
    #[track_caller]
    pub fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        self.at(severity).emit(args);
    }

    /// Emit a record at the severity registered under `level_name`.
    ///
    /// Unlike the level-specific methods this is an explicit operation and
    /// surfaces an unknown level name as an error.
    #[track_caller]
    pub fn log_named(&self, level_name: &str, args: fmt::Arguments<'_>) -> Result<(), Error> {
        match level_registry().severity_of(level_name) {
            Some(severity) => {
                self.at(severity).emit(args);
                Ok(())
            }
            None => Err(Error::invalid_config(format!(
                "level {level_name:?} is not registered"
            ))),
        }
    }

    /// Emit at TRACE.
    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.at(crate::TRACE).emit(args);
    }

    /// Emit at DEBUG.
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.at(crate::DEBUG).emit(args);
    }

    /// Emit at INFO.
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.at(crate::INFO).emit(args);
    }

    /// Emit at WARNING.
    #[track_caller]
    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.at(crate::WARNING).emit(args);
    }

    /// Emit at ERROR.
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.at(crate::ERROR).emit(args);
    }

    /// Emit at CRITICAL.
    #[track_caller]
    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.at(crate::CRITICAL).emit(args);
    }

    /// Write `text` to every sink without formatting: the console receives it
    /// verbatim, file sinks sanitize ANSI unless configured to preserve it.
    ///
    /// Retired loggers drop raw output silently, like any other emission.
    pub fn raw(&self, text: &str) {
        let state = self.state.read();
        if state.retired {
            return;
        }
        if let Some(console) = &state.console {
            report_sink_error("console", console.append_raw(text));
        }
        for file in &state.files {
            report_sink_error(
                &file.sink.path().display().to_string(),
                file.sink.append_raw(text),
            );
        }
    }

    /// The last record this logger dispatched, for test inspection.
    pub fn get_record(&self) -> Option<Arc<Record>> {
        self.last_record.lock().clone()
    }

    fn dispatch(&self, record: Record) {
        let record = Arc::new(record);
        *self.last_record.lock() = Some(record.clone());

        let state = self.state.read();
        if let Some(console) = &state.console {
            report_sink_error("console", console.append(&record));
        }
        for file in &state.files {
            report_sink_error(
                &file.sink.path().display().to_string(),
                file.sink.append(&record),
            );
        }
        drop(state);

        audit::dispatch(&record);
    }
}

fn report_sink_error(target: &str, result: anyhow::Result<()>) {
    if let Err(err) = result {
        eprintln!("logward: failed to write to sink {target}: {err:#}");
    }
}

/// A single event under construction.
///
/// Obtained from [`Logger::at`]; finished with [`Event::emit`]. Message
/// arguments are only formatted once the severity gate has passed.
#[derive(Debug)]
pub struct Event<'a> {
    logger: &'a Logger,
    severity: Severity,
    fields: Vec<(String, FieldValue)>,
    exception: Option<String>,
    with_stack: bool,
    task_name: Option<String>,
    call_site: Option<CallSite>,
}

impl Event<'_> {
    /// Attach a structured field. A later value under the same key wins.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        insert_field(&mut self.fields, key.into(), value.into());
        self
    }

    /// Attach a batch of structured fields.
    #[must_use]
    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        for (key, value) in fields {
            insert_field(&mut self.fields, key.into(), value.into());
        }
        self
    }

    /// Attach an exception: the error and its source chain are rendered into
    /// the record's diagnostics.
    #[must_use]
    pub fn exception(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        self.exception = Some(render_error_chain(err));
        self
    }

    /// Capture a stack snapshot at emission.
    #[must_use]
    pub fn with_stack(mut self) -> Self {
        self.with_stack = true;
        self
    }

    /// Name the task this event belongs to.
    #[must_use]
    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    /// Override the captured call site. The emission macros use this to carry
    /// the enclosing function name.
    #[must_use]
    pub fn call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    /// Emit the event. Records below the logger's effective severity, or on a
    /// retired logger, are dropped silently.
    #[track_caller]
    pub fn emit(self, args: fmt::Arguments<'_>) {
        if !self.logger.enabled(self.severity) {
            return;
        }

        let level_name = level_registry()
            .name_of(self.severity)
            .unwrap_or_else(|| self.severity.to_string());
        let call_site = self.call_site.unwrap_or_else(CallSite::caller);
        let stack = self
            .with_stack
            .then(|| std::backtrace::Backtrace::force_capture().to_string());

        let record = Record::new(
            self.severity,
            level_name,
            self.logger.name.clone(),
            fmt::format(args),
            self.fields,
            call_site,
            self.task_name,
            self.exception,
            stack,
        );
        self.logger.dispatch(record);
    }
}

fn insert_field(fields: &mut Vec<(String, FieldValue)>, key: String, value: FieldValue) {
    match fields.iter_mut().find(|(existing, _)| *existing == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::DEBUG;
    use crate::level::INFO;
    use crate::level::NOTSET;

    #[test]
    fn test_severity_gate_drops_records() {
        let logger = get_with_severity("logger.gate", INFO).unwrap();
        logger.debug(format_args!("not this one"));
        assert!(logger.get_record().is_none());

        logger.info(format_args!("this one"));
        let record = logger.get_record().unwrap();
        assert_eq!(record.message(), "this one");
        assert_eq!(record.level_name(), "INFO");
    }

    #[test]
    fn test_event_fields_later_value_wins() {
        let logger = get_with_severity("logger.fields", DEBUG).unwrap();
        logger
            .at(INFO)
            .fields([("user", "alice"), ("user", "bob")])
            .field("user", "carol")
            .emit(format_args!("who"));
        let record = logger.get_record().unwrap();
        assert_eq!(record.fields().len(), 1);
        assert_eq!(record.fields()[0].1, FieldValue::from("carol"));
    }

    #[test]
    fn test_call_site_captured_through_methods() {
        let logger = get_with_severity("logger.site", DEBUG).unwrap();
        logger.info(format_args!("where am i"));
        let record = logger.get_record().unwrap();
        assert_eq!(record.call_site().file_name(), "mod.rs");
        assert!(record.call_site().line() > 0);
    }

    #[test]
    fn test_unknown_named_level_is_an_error() {
        let logger = get_with_severity("logger.named", DEBUG).unwrap();
        let err = logger
            .log_named("NO_SUCH_LEVEL", format_args!("x"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_retired_logger_drops_silently_and_rejects_sinks() {
        let logger = get_with_severity("logger.retired", DEBUG).unwrap();
        logger.info(format_args!("before"));
        logger.retire();
        assert!(logger.retired());

        logger.info(format_args!("after"));
        assert_eq!(logger.get_record().unwrap().message(), "before");

        let err = logger.add_console().unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }

    #[test]
    fn test_destroy_allows_fresh_logger() {
        let logger = get_with_severity("logger.destroyed", DEBUG).unwrap();
        logger.retire();
        logger.destroy();

        let fresh = get("logger.destroyed").unwrap();
        assert!(!fresh.retired());
        assert!(fresh.output_targets().is_empty());
        assert_eq!(fresh.severity(), NOTSET);
    }

    #[test]
    fn test_duplicate_console_rejected() {
        let logger = get_with_severity("logger.console", DEBUG).unwrap();
        logger.add_console().unwrap();
        let err = logger.add_console().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        logger.remove_console().unwrap();
        let err = logger.remove_console().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_exception_chain_lands_on_record() {
        let logger = get_with_severity("logger.exc", DEBUG).unwrap();
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        logger
            .at(crate::ERROR)
            .exception(&io)
            .emit(format_args!("open failed"));
        let record = logger.get_record().unwrap();
        assert_eq!(record.exception(), Some("denied"));
    }
}
