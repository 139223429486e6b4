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

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::LazyLock;

use parking_lot::Mutex;

use crate::level::Severity;
use crate::level::NOTSET;
use crate::level::WARNING;
use crate::logger::Logger;
use crate::record;
use crate::Error;

/// The reserved name of the registry's internal root.
pub const ROOT: &str = "root";

struct RegistryInner {
    loggers: HashMap<String, Arc<Logger>>,
    root_severity: Severity,
    // every file path with a live sink in this process; a second sink on the
    // same target is almost always a configuration mistake
    active_file_paths: HashSet<PathBuf>,
}

static REGISTRY: LazyLock<Mutex<RegistryInner>> = LazyLock::new(|| {
    // anchor relative_created at first registry use
    LazyLock::force(&record::START);
    Mutex::new(RegistryInner {
        loggers: HashMap::new(),
        root_severity: WARNING,
        active_file_paths: HashSet::new(),
    })
});

/// Installs the internal root with the given default severity.
///
/// Idempotent when called again with the same severity; a different severity
/// replaces the root's.
pub fn initialize(default_severity: Severity) {
    REGISTRY.lock().root_severity = default_severity;
}

/// Returns the logger registered under `name`, creating it with severity
/// NOTSET if absent. The name `root` is reserved.
///
/// A previously retired logger is returned as-is: the name stays reserved
/// until the logger is destroyed and recreated.
pub fn get(name: &str) -> Result<Arc<Logger>, Error> {
    get_or_create(name, None)
}

/// As [`get`], but sets the logger's explicit severity.
pub fn get_with_severity(name: &str, severity: Severity) -> Result<Arc<Logger>, Error> {
    get_or_create(name, Some(severity))
}

fn get_or_create(name: &str, severity: Option<Severity>) -> Result<Arc<Logger>, Error> {
    if name == ROOT {
        return Err(Error::name_conflict(
            "logger name \"root\" is reserved for the internal root; choose a different name",
        ));
    }
    if name.is_empty() {
        return Err(Error::invalid_config("logger name must not be empty"));
    }

    let mut registry = REGISTRY.lock();
    let logger = registry
        .loggers
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Logger::new(name, severity.unwrap_or(NOTSET))))
        .clone();
    drop(registry);

    if let Some(severity) = severity {
        logger.set_severity(severity);
    }
    Ok(logger)
}

/// The effective severity of the nearest ancestor of `name` with an explicit
/// one, falling back to the root's.
pub(crate) fn resolve_parent_severity(name: &str) -> Severity {
    let registry = REGISTRY.lock();
    let mut remainder = name;
    while let Some(dot) = remainder.rfind('.') {
        remainder = &remainder[..dot];
        if let Some(ancestor) = registry.loggers.get(remainder) {
            let explicit = ancestor.severity();
            if !explicit.is_notset() {
                return explicit;
            }
        }
    }
    registry.root_severity
}

pub(crate) fn remove(name: &str) {
    REGISTRY.lock().loggers.remove(name);
}

pub(crate) fn reserve_file_path(path: &Path) -> Result<(), Error> {
    let mut registry = REGISTRY.lock();
    if !registry.active_file_paths.insert(path.to_path_buf()) {
        return Err(Error::name_conflict(format!(
            "a file sink for {} is already active in this process",
            path.display()
        )));
    }
    Ok(())
}

pub(crate) fn release_file_path(path: &Path) {
    REGISTRY.lock().active_file_paths.remove(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::DEBUG;
    use crate::level::INFO;

    #[test]
    fn test_root_name_is_reserved() {
        let err = get(ROOT).unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
        let err = get_with_severity(ROOT, INFO).unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
    }

    #[test]
    fn test_get_returns_same_instance() {
        let first = get("registry.same").unwrap();
        let second = get("registry.same").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parent_severity_resolution() {
        initialize(INFO);
        let _parent = get_with_severity("registry.chain", DEBUG).unwrap();
        let child = get("registry.chain.api").unwrap();
        assert_eq!(child.severity(), NOTSET);
        assert_eq!(resolve_parent_severity("registry.chain.api"), DEBUG);
        // no ancestor in between: falls through to the chain root
        assert_eq!(resolve_parent_severity("registry.chain.api.v2.deep"), DEBUG);
        // unrelated name falls back to the root severity
        assert_eq!(resolve_parent_severity("registry.orphan.child"), INFO);
    }

    #[test]
    fn test_file_path_reservation() {
        let path = Path::new("/tmp/logward-registry-test/x.log");
        reserve_file_path(path).unwrap();
        let err = reserve_file_path(path).unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
        release_file_path(path);
        reserve_file_path(path).unwrap();
        release_file_path(path);
    }
}
