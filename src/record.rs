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

//! Immutable log records and their structured field values.

use std::fmt;
use std::panic::Location;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::LazyLock;
use std::time::Instant;

use jiff::Zoned;

use crate::level::Severity;

/// The instant the logging system was first touched; `relative_created`
/// values are measured against it.
pub(crate) static START: LazyLock<Instant> = LazyLock::new(Instant::now);

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_IDENTITY: (u64, String) = {
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        let name = std::thread::current()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("thread-{id}"));
        (id, name)
    };
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// A value attached to a record as a structured field.
///
/// The formatter serializes strings single-quoted, numbers and booleans bare,
/// [`FieldValue::Null`] as `null`, and nested maps recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A string value.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An absent value.
    Null,
    /// An ordered nested mapping.
    Map(Vec<(String, FieldValue)>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "'{s}'"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::UInt(n) => write!(f, "{n}"),
            FieldValue::Float(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Map(entries) => {
                write!(f, "{{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::UInt(value as u64)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => FieldValue::Null,
        }
    }
}

/// The source location an event was emitted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    file: String,
    line: u32,
    function: Option<String>,
}

impl CallSite {
    /// Build a call site from explicit components. The emission macros use
    /// this together with `file!`/`line!` and the captured function name.
    pub fn here(file: &str, line: u32, function: Option<&str>) -> CallSite {
        CallSite {
            file: file.to_string(),
            line,
            function: function.map(str::to_string),
        }
    }

    /// Capture the location of the (tracked) caller. Function names are only
    /// available through the macros.
    #[track_caller]
    pub fn caller() -> CallSite {
        let location = Location::caller();
        CallSite {
            file: location.file().to_string(),
            line: location.line(),
            function: None,
        }
    }

    /// The full path of the source file.
    pub fn file_path(&self) -> &str {
        &self.file
    }

    /// The basename of the source file.
    pub fn file_name(&self) -> &str {
        std::path::Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }

    /// The 1-based source line the event was emitted from.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The enclosing function, when captured by the emission macros.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }
}

/// An immutable snapshot of one log event.
///
/// Records are built once per dispatched event, after the severity gate has
/// passed, and handed to every sink by shared reference. Sinks never mutate
/// them.
#[derive(Debug, Clone)]
pub struct Record {
    timestamp: Zoned,
    severity: Severity,
    level_name: String,
    logger_name: String,
    message: String,
    fields: Vec<(String, FieldValue)>,
    call_site: CallSite,
    thread_id: u64,
    thread_name: String,
    process_id: u32,
    process_name: String,
    task_name: Option<String>,
    relative_created_ms: u64,
    exception: Option<String>,
    stack: Option<String>,
}

impl Record {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        severity: Severity,
        level_name: String,
        logger_name: String,
        message: String,
        fields: Vec<(String, FieldValue)>,
        call_site: CallSite,
        task_name: Option<String>,
        exception: Option<String>,
        stack: Option<String>,
    ) -> Record {
        let (thread_id, thread_name) =
            THREAD_IDENTITY.with(|identity| (identity.0, identity.1.clone()));
        Record {
            timestamp: Zoned::now(),
            severity,
            level_name,
            logger_name,
            message,
            fields,
            call_site,
            thread_id,
            thread_name,
            process_id: std::process::id(),
            process_name: process_name(),
            task_name,
            relative_created_ms: START.elapsed().as_millis() as u64,
            exception,
            stack,
        }
    }

    /// The wall clock time the event was emitted, with microsecond precision.
    pub fn timestamp(&self) -> &Zoned {
        &self.timestamp
    }

    /// The severity the event was emitted at.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The name the severity resolved to in the level registry at emission.
    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    /// The dotted name of the logger that dispatched the record.
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// The rendered message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured fields, in insertion order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// The source location the event was emitted from.
    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    /// A process-unique id of the emitting thread.
    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    /// The emitting thread's name, or `thread-<id>` for unnamed threads.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// The OS id of the emitting process.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// The executable name of the emitting process.
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// The task the event was tagged with at emission, if any.
    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    /// Milliseconds since the logging system was first used.
    pub fn relative_created_ms(&self) -> u64 {
        self.relative_created_ms
    }

    /// The rendered exception chain, if the event carried one.
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// The rendered stack capture, if requested at emission.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// Renders an error and its source chain, one cause per line.
pub(crate) fn render_error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
