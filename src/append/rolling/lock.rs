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

//! The OS advisory lock that serializes writers of one log file across
//! processes.
//!
//! The lock lives on a sibling `<base>.lock` file, which persists. It is
//! advisory: only cooperating writers honor it. Acquisition blocks until the
//! lock is available.

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub(crate) struct LockFile {
    file: File,
}

impl LockFile {
    pub(crate) fn open(path: &Path) -> io::Result<LockFile> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(LockFile { file })
    }

    #[cfg(unix)]
    pub(crate) fn acquire(&self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        loop {
            let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_EX) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(err);
            }
        }
    }

    #[cfg(unix)]
    pub(crate) fn release(&self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(windows)]
    pub(crate) fn acquire(&self) -> io::Result<()> {
        use std::os::windows::io::AsRawHandle;

        use windows_sys::Win32::Storage::FileSystem::LockFileEx;
        use windows_sys::Win32::Storage::FileSystem::LOCKFILE_EXCLUSIVE_LOCK;
        use windows_sys::Win32::System::IO::OVERLAPPED;

        // lock one byte at offset zero; enough to serialize access
        let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            LockFileEx(
                self.file.as_raw_handle() as _,
                LOCKFILE_EXCLUSIVE_LOCK,
                0,
                1,
                0,
                &mut overlapped,
            )
        };
        if rc == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    #[cfg(windows)]
    pub(crate) fn release(&self) -> io::Result<()> {
        use std::os::windows::io::AsRawHandle;

        use windows_sys::Win32::Storage::FileSystem::UnlockFileEx;
        use windows_sys::Win32::System::IO::OVERLAPPED;

        let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            UnlockFileEx(self.file.as_raw_handle() as _, 0, 1, 0, &mut overlapped)
        };
        if rc == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}
