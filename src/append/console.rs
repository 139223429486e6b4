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

use std::io::Write;

use parking_lot::Mutex;

use crate::append::Append;
use crate::layout::ColorLayout;
use crate::layout::Layout;
use crate::layout::RecordDetails;
use crate::record::Record;

/// A sink that writes log records to standard output.
///
/// Writes are serialized by the sink's own mutex and always rendered with the
/// color layout. The raw path writes the payload verbatim, which is what the
/// banner and gradient helpers build on.
#[derive(Debug)]
pub struct Console {
    layout: ColorLayout,
    stdout: Mutex<()>,
}

impl Default for Console {
    fn default() -> Self {
        Console::new(RecordDetails::default())
    }
}

impl Console {
    /// Create a console sink with the given record details.
    pub fn new(details: RecordDetails) -> Console {
        Console {
            layout: ColorLayout::new(details),
            stdout: Mutex::new(()),
        }
    }

    fn write_line(&self, mut bytes: Vec<u8>) -> anyhow::Result<()> {
        bytes.push(b'\n');
        let _serialized = self.stdout.lock();
        std::io::stdout().write_all(&bytes)?;
        Ok(())
    }
}

impl Append for Console {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        self.write_line(self.layout.format(record))
    }

    fn append_raw(&self, text: &str) -> anyhow::Result<()> {
        self.write_line(text.as_bytes().to_vec())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let _serialized = self.stdout.lock();
        std::io::stdout().flush()?;
        Ok(())
    }

    fn close(&self) {
        // stdout is not ours to close; flushing is all there is to do
        let _ = self.flush();
    }
}
