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

/// The error type returned by fallible logward operations.
///
/// Emission itself never returns an error: sink failures during dispatch are
/// reported on stderr and the record is dropped for that sink only. This type
/// covers construction-time validation and explicit lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value object was constructed with illegal fields.
    ///
    /// The message names the offending field.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reserved or already-taken name was used.
    #[error("name conflict: {0}")]
    NameConflict(String),

    /// An explicit operation was attempted on a retired or destroyed logger.
    #[error("lifecycle violation: {0}")]
    Lifecycle(String),

    /// An IO action failed while constructing or tearing down a sink.
    #[error("failed to perform IO action: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    pub(crate) fn name_conflict(message: impl Into<String>) -> Self {
        Error::NameConflict(message.into())
    }

    pub(crate) fn lifecycle(message: impl Into<String>) -> Self {
        Error::Lifecycle(message.into())
    }
}
