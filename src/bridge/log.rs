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

use crate::level::Severity;
use crate::record::CallSite;
use crate::record::FieldValue;

struct LogCrateBridge(());

fn severity_of(level: log::Level) -> Severity {
    match level {
        log::Level::Error => crate::ERROR,
        log::Level::Warn => crate::WARNING,
        log::Level::Info => crate::INFO,
        log::Level::Debug => crate::DEBUG,
        log::Level::Trace => crate::TRACE,
    }
}

fn target_logger(target: &str) -> &str {
    // the registry reserves "root"; records logged against it land on a
    // regular logger named after the log crate itself
    if target.is_empty() || target == crate::logger::ROOT {
        "log"
    } else {
        target
    }
}

impl log::Log for LogCrateBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        match crate::get(target_logger(metadata.target())) {
            Ok(logger) => logger.enabled(severity_of(metadata.level())),
            Err(_) => false,
        }
    }

    fn log(&self, record: &log::Record) {
        let Ok(logger) = crate::get(target_logger(record.target())) else {
            return;
        };

        let mut kvs = Vec::new();

        struct KeyValueVisitor<'b> {
            kvs: &'b mut Vec<(String, FieldValue)>,
        }

        impl<'a> log::kv::VisitSource<'a> for KeyValueVisitor<'_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'a>,
                value: log::kv::Value<'a>,
            ) -> Result<(), log::kv::Error> {
                self.kvs
                    .push((key.as_str().to_string(), FieldValue::Str(value.to_string())));
                Ok(())
            }
        }

        let mut visitor = KeyValueVisitor { kvs: &mut kvs };
        let _ = record.key_values().visit(&mut visitor);

        let call_site = CallSite::here(
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or_default(),
            record.module_path(),
        );

        logger
            .at(severity_of(record.level()))
            .fields(kvs)
            .call_site(call_site)
            .emit(*record.args());
    }

    fn flush(&self) {}
}

/// Set up the log crate global logger, forwarding every `log` record into the
/// logward logger named after the record's target.
///
/// This should be called early in the execution of a Rust program. Any log
/// events that occur before initialization will be ignored.
///
/// This function will set the log crate global maximum level to `Trace`;
/// filtering stays with the logward severity resolution. To override this,
/// call [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static BRIDGE: LogCrateBridge = LogCrateBridge(());
    log::set_logger(&BRIDGE)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger, forwarding every `log` record into the
/// logward logger named after the record's target.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "logward::bridge::setup_log_crate must be called before the log crate global logger initialized",
    );
}
