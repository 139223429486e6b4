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

//! Emission macros that capture the enclosing function name.
//!
//! The logger methods capture file and line through `#[track_caller]`; only a
//! macro expanded at the call site can also name the enclosing function, so
//! application code should prefer these.

/// Captures the name of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // strip the trailing "::f"
        &name[..name.len() - 3]
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit_at {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {
        $crate::Logger::at(&$logger, $severity)
            .call_site($crate::record::CallSite::here(
                file!(),
                line!(),
                ::std::option::Option::Some($crate::__function_name!()),
            ))
            .emit(format_args!($($arg)+))
    };
}

/// Emit a record at TRACE with full call-site capture.
///
/// ```
/// let logger = logward::get("demo").unwrap();
/// logward::trace!(logger, "polling {} backends", 3);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::TRACE, $($arg)+)
    };
}

/// Emit a record at DEBUG with full call-site capture.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::DEBUG, $($arg)+)
    };
}

/// Emit a record at INFO with full call-site capture.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::INFO, $($arg)+)
    };
}

/// Emit a record at WARNING with full call-site capture.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::WARNING, $($arg)+)
    };
}

/// Emit a record at ERROR with full call-site capture.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::ERROR, $($arg)+)
    };
}

/// Emit a record at CRITICAL with full call-site capture.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit_at!($logger, $crate::CRITICAL, $($arg)+)
    };
}

/// Emit a record at a registered level, keyed by name, with full call-site
/// capture. Evaluates to a `Result`: an unregistered level name is an error.
///
/// ```
/// use logward::ansi::Color;
/// use logward::LevelStyle;
/// use logward::Severity;
///
/// logward::register_level("NOTICE", Severity(25), LevelStyle::fg(Color::Fixed(208))).unwrap();
/// let logger = logward::get_with_severity("demo.notice", logward::DEBUG).unwrap();
/// logward::emit!(logger, "NOTICE", "deployment {} finished", "v42").unwrap();
/// ```
#[macro_export]
macro_rules! emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        match $crate::level_registry().severity_of($level) {
            ::std::option::Option::Some(severity) => {
                $crate::__emit_at!($logger, severity, $($arg)+);
                ::std::result::Result::Ok(())
            }
            ::std::option::Option::None => {
                ::std::result::Result::Err($crate::Error::InvalidConfig(format!(
                    "level {:?} is not registered",
                    $level
                )))
            }
        }
    };
}
