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

#![deny(missing_docs)]

//! Logward is a structured, color-aware, concurrency-safe logging library:
//! named loggers with severity inheritance, declarative record formatting
//! with ANSI color, rotating file sinks that are safe across processes, and
//! a global audit stream.
//!
//! # Overview
//!
//! Loggers live in a process-wide registry under dotted names. Each logger
//! owns its sinks (at most one console, any number of rotating files) and
//! never inherits sinks from an ancestor; only severity flows down the name
//! hierarchy. Rotating file sinks coordinate writers across processes with
//! an advisory lock and atomic renames. The audit controller mirrors every
//! record from every logger into one central file.
//!
//! # Examples
//!
//! Console logging with severity inheritance:
//!
//! ```
//! logward::initialize(logward::INFO);
//!
//! let logger = logward::get("app").unwrap();
//! logger.add_console().unwrap();
//! logward::info!(logger, "listening on {}", "0.0.0.0:8080");
//! ```
//!
//! A rotating file sink with retention:
//!
//! ```no_run
//! use logward::rolling::RotationLogic;
//! use logward::FileOptions;
//!
//! let logger = logward::get_with_severity("app.io", logward::DEBUG).unwrap();
//! let rotation = RotationLogic::builder()
//!     .max_bytes(10 * 1024 * 1024)
//!     .backup_count(5)
//!     .build()
//!     .unwrap();
//! logger
//!     .add_file("/var/log/app", FileOptions::new().rotation(rotation))
//!     .unwrap();
//! ```

pub mod ansi;
pub mod append;
pub mod bridge;
pub mod layout;
pub mod record;

mod audit;
mod error;
mod level;
mod logger;
mod macros;

pub use self::append::rolling;
pub use self::audit::audit_everything;
pub use self::audit::auditing;
pub use self::audit::terminate_auditing;
pub use self::error::Error;
pub use self::level::apply_color_theme;
pub use self::level::level_registry;
pub use self::level::levels;
pub use self::level::override_level;
pub use self::level::register_level;
pub use self::level::LevelRegistry;
pub use self::level::LevelStyle;
pub use self::level::Severity;
pub use self::level::CRITICAL;
pub use self::level::DEBUG;
pub use self::level::ERROR;
pub use self::level::INFO;
pub use self::level::NOTSET;
pub use self::level::TRACE;
pub use self::level::WARNING;
pub use self::logger::get;
pub use self::logger::get_with_severity;
pub use self::logger::initialize;
pub use self::logger::Event;
pub use self::logger::FileOptions;
pub use self::logger::Logger;
