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

//! The rotating file sink and its rotation policy.
//!
//! A sink at `<dir>/<base>.<ext>` keeps rotated siblings `<base>.<ext>.1`,
//! `<base>.<ext>.2`, … and coordinates writers across processes through an
//! advisory lock on `<base>.<ext>.lock`. Rollover goes through the OS atomic
//! rename primitive, so readers never observe a half-rotated state.

use std::path::Path;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::ansi;
use crate::append::Append;
use crate::layout::Layout;
use crate::record::Record;
use crate::Error;

mod clock;
mod lock;
mod rotation;
mod writer;

pub use self::rotation::ExpirationRule;
pub use self::rotation::ExpirationScale;
pub use self::rotation::RotationLogic;
pub use self::rotation::RotationLogicBuilder;
pub use self::rotation::RotationTimestamp;
pub use self::rotation::When;

use self::clock::WallClock;
use self::writer::RollingFileWriter;

/// A file sink with optional size/time rotation and retention.
///
/// Writes are serialized by the sink's in-process mutex and, across
/// processes, by the advisory lock the writer takes around every append.
/// A closed sink drops records silently; closing is idempotent.
#[derive(Debug)]
pub struct RollingFile {
    layout: Box<dyn Layout>,
    preserve_ansi: bool,
    path: PathBuf,
    writer: Mutex<Option<RollingFileWriter>>,
}

impl RollingFile {
    /// Opens (or creates) the target file. `dir` must be absolute; the
    /// directory is created if missing.
    pub fn open(
        dir: &Path,
        file_name: &str,
        layout: impl Into<Box<dyn Layout>>,
        rotation: Option<RotationLogic>,
        preserve_ansi: bool,
    ) -> Result<RollingFile, Error> {
        let writer = RollingFileWriter::open(dir, file_name, rotation, WallClock::System)?;
        Ok(RollingFile {
            layout: layout.into(),
            preserve_ansi,
            path: writer.path().to_path_buf(),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// The resolved path of the active file, after suffix rules.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, mut bytes: Vec<u8>) -> anyhow::Result<()> {
        bytes.push(b'\n');
        let mut writer = self.writer.lock();
        match writer.as_mut() {
            Some(writer) => writer.write(&bytes),
            None => Ok(()),
        }
    }
}

impl Append for RollingFile {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        self.write_line(self.layout.format(record))
    }

    fn append_raw(&self, text: &str) -> anyhow::Result<()> {
        let payload = if self.preserve_ansi {
            text.to_string()
        } else {
            ansi::strip(text)
        };
        self.write_line(payload.into_bytes())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock();
        match writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn close(&self) {
        let mut writer = self.writer.lock();
        if let Some(mut writer) = writer.take() {
            writer.close();
        }
    }
}
