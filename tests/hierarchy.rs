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

use std::fs;

use logward::FileOptions;
use logward::DEBUG;
use logward::INFO;
use logward::NOTSET;
use tempfile::TempDir;

#[test]
fn test_child_inherits_parent_severity_and_sinks_stay_separate() {
    let temp_dir = TempDir::new().unwrap();

    let parent = logward::get_with_severity("app", DEBUG).unwrap();
    let child = logward::get("app.api").unwrap();
    assert_eq!(child.severity(), NOTSET);
    assert_eq!(child.effective_severity(), DEBUG);

    parent
        .add_file(
            temp_dir.path(),
            FileOptions::new().file_name("parent.log"),
        )
        .unwrap();
    child
        .add_file(temp_dir.path(), FileOptions::new().file_name("child.log"))
        .unwrap();

    child.debug(format_args!("a child record"));

    let child_log = fs::read_to_string(temp_dir.path().join("child.log")).unwrap();
    assert_eq!(child_log.lines().count(), 1);
    assert!(child_log.contains("a child record"));

    // no handler inheritance: the parent's sink saw nothing
    let parent_log = fs::read_to_string(temp_dir.path().join("parent.log")).unwrap();
    assert!(parent_log.is_empty());
}

#[test]
fn test_severity_monotonicity_against_root() {
    logward::initialize(INFO);
    let temp_dir = TempDir::new().unwrap();

    let logger = logward::get("mono").unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("mono.log"))
        .unwrap();

    logger.debug(format_args!("below the gate"));
    logger.info(format_args!("at the gate"));
    logger.error(format_args!("above the gate"));

    let content = fs::read_to_string(temp_dir.path().join("mono.log")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("at the gate"));
    assert!(lines[1].contains("above the gate"));
}

#[test]
fn test_explicit_severity_beats_inherited() {
    let parent = logward::get_with_severity("quiet", logward::ERROR).unwrap();
    let child = logward::get_with_severity("quiet.noisy", DEBUG).unwrap();
    assert_eq!(parent.effective_severity(), logward::ERROR);
    assert_eq!(child.effective_severity(), DEBUG);
    assert!(child.enabled(DEBUG));
    assert!(!parent.enabled(DEBUG));
}

#[test]
fn test_retire_closes_sinks_and_reserves_name() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("lifecycle.retire", DEBUG).unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("r.log"))
        .unwrap();

    logger.info(format_args!("kept"));
    logger.retire();
    logger.info(format_args!("dropped"));

    let content = fs::read_to_string(temp_dir.path().join("r.log")).unwrap();
    assert_eq!(content.lines().count(), 1);

    // the name stays reserved: get() returns the same retired logger
    let same = logward::get("lifecycle.retire").unwrap();
    assert!(same.retired());
}

#[test]
fn test_destroy_then_recreate_is_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("lifecycle.destroy", DEBUG).unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("d.log"))
        .unwrap();
    logger.destroy();

    let fresh = logward::get("lifecycle.destroy").unwrap();
    assert!(!fresh.retired());
    assert!(fresh.output_targets().is_empty());

    // the destroyed logger released its file path: re-adding works
    fresh
        .add_file(temp_dir.path(), FileOptions::new().file_name("d.log"))
        .unwrap();
}

#[test]
fn test_duplicate_file_sink_rejected_across_loggers() {
    let temp_dir = TempDir::new().unwrap();
    let one = logward::get_with_severity("dup.one", DEBUG).unwrap();
    let two = logward::get_with_severity("dup.two", DEBUG).unwrap();

    one.add_file(temp_dir.path(), FileOptions::new().file_name("shared.log"))
        .unwrap();
    let err = two
        .add_file(temp_dir.path(), FileOptions::new().file_name("shared.log"))
        .unwrap_err();
    assert!(matches!(err, logward::Error::NameConflict(_)));
}

#[test]
fn test_relative_log_dir_rejected() {
    let logger = logward::get_with_severity("dirs", DEBUG).unwrap();
    let err = logger
        .add_file("relative/logs", FileOptions::new())
        .unwrap_err();
    assert!(matches!(err, logward::Error::InvalidConfig(_)));
}

#[test]
fn test_output_targets_lists_console_and_files() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("targets", DEBUG).unwrap();
    logger.add_console().unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("t.log"))
        .unwrap();

    let targets = logger.output_targets();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0], "console");
    assert!(targets[1].ends_with("t.log"));

    logger
        .remove_file(temp_dir.path(), "t.log")
        .unwrap();
    assert_eq!(logger.output_targets(), vec!["console".to_string()]);
}
