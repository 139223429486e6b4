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

use logward::layout::OptionalRecordFields;
use logward::layout::RecordDetails;
use logward::FileOptions;
use logward::DEBUG;
use tempfile::TempDir;

#[test]
fn test_disabled_field_in_order_is_rejected_naming_the_field() {
    let err = RecordDetails::builder()
        .optional_fields(OptionalRecordFields {
            lineno: false,
            func_name: true,
            ..OptionalRecordFields::default()
        })
        .message_parts_order(["lineno", "level", "func_name"])
        .build()
        .unwrap_err();
    assert!(matches!(err, logward::Error::InvalidConfig(_)));
    assert!(err.to_string().contains("lineno"));
}

#[test]
fn test_rendered_line_shape_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("format.shape", DEBUG).unwrap();

    let details = RecordDetails::builder()
        .datefmt("%Y-%m-%d %H:%M:%S.%3f")
        .separator('|')
        .optional_fields(OptionalRecordFields {
            logger_name: true,
            lineno: true,
            func_name: true,
            ..OptionalRecordFields::default()
        })
        .message_parts_order(["logger_name", "level", "func_name", "lineno"])
        .build()
        .unwrap();

    logger
        .add_file(
            temp_dir.path(),
            FileOptions::new().file_name("shape.log").details(details),
        )
        .unwrap();

    logward::info!(logger, "handled {} requests", 7);

    let content = fs::read_to_string(temp_dir.path().join("shape.log")).unwrap();
    let line = content.lines().next().unwrap();
    let parts: Vec<&str> = line.split(" | ").collect();
    assert_eq!(parts.len(), 6);

    // timestamp first: "YYYY-MM-DD HH:MM:SS.mmm"
    assert_eq!(parts[0].len(), 23);
    assert!(parts[0].starts_with("20"));
    // the declared middle order
    assert_eq!(parts[1], "format.shape");
    assert_eq!(parts[2], "INFO    ");
    assert!(parts[3].ends_with("test_rendered_line_shape_end_to_end"));
    assert!(parts[4].bytes().all(|b| b.is_ascii_digit()));
    // message last
    assert_eq!(parts[5], "handled 7 requests");
}

#[test]
fn test_structured_fields_and_diagnostics_through_a_sink() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("format.fields", DEBUG).unwrap();

    let details = RecordDetails::builder()
        .optional_fields(OptionalRecordFields {
            exc_info: true,
            ..OptionalRecordFields::default()
        })
        .build()
        .unwrap();
    logger
        .add_file(
            temp_dir.path(),
            FileOptions::new().file_name("fields.log").details(details),
        )
        .unwrap();

    let cause = std::io::Error::new(std::io::ErrorKind::NotFound, "no such table");
    logger
        .at(logward::ERROR)
        .field("query", "select 1")
        .field("attempt", 2u32)
        .exception(&cause)
        .emit(format_args!("query failed"));

    let content = fs::read_to_string(temp_dir.path().join("fields.log")).unwrap();
    let mut lines = content.lines();
    let first = lines.next().unwrap();
    assert!(first.ends_with("query failed { query = 'select 1', attempt = 2 }"));
    assert_eq!(lines.next().unwrap(), "no such table");
}

#[test]
fn test_raw_bypasses_formatting() {
    let temp_dir = TempDir::new().unwrap();
    let logger = logward::get_with_severity("format.raw", DEBUG).unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("raw.log"))
        .unwrap();

    logger.raw("=== banner \x1b[38;5;46mgreen\x1b[0m ===");

    let content = fs::read_to_string(temp_dir.path().join("raw.log")).unwrap();
    assert_eq!(content, "=== banner green ===\n");
}

#[test]
fn test_registered_level_emission_by_name() {
    use logward::ansi::Color;
    use logward::LevelStyle;
    use logward::Severity;

    let temp_dir = TempDir::new().unwrap();
    logward::register_level("AUDITABLE", Severity(35), LevelStyle::fg(Color::Fixed(208)))
        .unwrap();

    let logger = logward::get_with_severity("format.custom", DEBUG).unwrap();
    logger
        .add_file(temp_dir.path(), FileOptions::new().file_name("custom.log"))
        .unwrap();

    logward::emit!(logger, "AUDITABLE", "custom level {}", "works").unwrap();
    let err = logward::emit!(logger, "MISSING_LEVEL", "never").unwrap_err();
    assert!(matches!(err, logward::Error::InvalidConfig(_)));

    let content = fs::read_to_string(temp_dir.path().join("custom.log")).unwrap();
    let line = content.lines().next().unwrap();
    assert!(line.contains("AUDITABLE"));
    assert!(line.ends_with("custom level works"));

    let record = logger.get_record().unwrap();
    assert_eq!(record.severity(), Severity(35));
    assert_eq!(record.level_name(), "AUDITABLE");
}

#[test]
fn test_macro_captures_function_name() {
    let logger = logward::get_with_severity("format.macro", DEBUG).unwrap();
    logward::debug!(logger, "where");
    let record = logger.get_record().unwrap();
    let function = record.call_site().function().unwrap();
    assert!(function.ends_with("test_macro_captures_function_name"));
    assert_eq!(record.call_site().file_name(), "format.rs");
}
