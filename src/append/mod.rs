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

//! Sinks that log records are dispatched to.

use std::fmt;

use crate::record::Record;

mod console;
pub mod rolling;

pub use self::console::Console;
pub use self::rolling::RollingFile;

/// An output destination for log records.
///
/// A sink owns its resources and serializes its own writes. Failures returned
/// from [`Append::append`] are contained by the dispatching logger: they are
/// reported on stderr and never surface from an emission call.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Formats and durably writes a log record.
    fn append(&self, record: &Record) -> anyhow::Result<()>;

    /// Writes a raw payload, bypassing formatting.
    fn append_raw(&self, text: &str) -> anyhow::Result<()>;

    /// Flushes any buffered bytes.
    fn flush(&self) -> anyhow::Result<()>;

    /// Flushes and releases the sink's resources. Closing is idempotent; a
    /// closed sink drops subsequent records silently.
    fn close(&self);
}
