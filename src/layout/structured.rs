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

use std::fmt::Write;

use crate::ansi;
use crate::ansi::Color;
use crate::ansi::Intensity;
use crate::ansi::Style;
use crate::layout::details::format_timestamp;
use crate::layout::details::RecordDetails;
use crate::layout::details::RecordPart;
use crate::layout::Layout;
use crate::level::level_registry;
use crate::level::LevelStyle;
use crate::record::Record;

const LEVEL_WIDTH: usize = 8;

/// A layout that renders records as plain text, with any ANSI sequences
/// stripped from the result. Used by file sinks.
///
/// Output format (default details):
///
/// ```text
/// 2024-08-02 12:49:03.102 • INFO     • Hello info!
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlainLayout {
    details: RecordDetails,
}

impl PlainLayout {
    /// Create a plain layout with the given details.
    pub fn new(details: RecordDetails) -> PlainLayout {
        PlainLayout { details }
    }
}

impl Layout for PlainLayout {
    fn format(&self, record: &Record) -> Vec<u8> {
        ansi::strip(&render(record, &self.details, false)).into_bytes()
    }
}

/// A layout that renders records with ANSI color: the level token carries its
/// registered [`LevelStyle`], the message shares the level foreground, and
/// metadata fields are dimmed. Used by console sinks.
#[derive(Debug, Clone, Default)]
pub struct ColorLayout {
    details: RecordDetails,
}

impl ColorLayout {
    /// Create a color layout with the given details.
    pub fn new(details: RecordDetails) -> ColorLayout {
        ColorLayout { details }
    }
}

impl Layout for ColorLayout {
    fn format(&self, record: &Record) -> Vec<u8> {
        render(record, &self.details, true).into_bytes()
    }
}

struct Painter {
    colored: bool,
    level_style: Option<LevelStyle>,
    color_all: bool,
}

impl Painter {
    fn level(&self, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        match self.level_style {
            Some(style) => ansi::paint(
                text,
                &Style {
                    fg: Some(style.fg),
                    bg: style.bg,
                    intensity: style.intensity,
                    styles: style.styles,
                },
            ),
            None => text.to_string(),
        }
    }

    fn message(&self, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        match self.level_style {
            Some(style) => ansi::paint(text, &Style::fg(style.fg)),
            None => text.to_string(),
        }
    }

    fn meta(&self, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        let style = match (self.color_all, self.level_style) {
            (true, Some(style)) => Style {
                fg: Some(style.fg),
                intensity: Intensity::Dim,
                ..Style::default()
            },
            _ => Style::dim(),
        };
        ansi::paint(text, &style)
    }

    fn separator(&self, separator: char) -> String {
        if !self.colored {
            return separator.to_string();
        }
        ansi::paint(
            &separator.to_string(),
            &Style {
                fg: Some(Color::BrightWhite),
                intensity: Intensity::Bold,
                ..Style::default()
            },
        )
    }

    fn field_key(&self, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        ansi::paint(
            text,
            &Style {
                fg: Some(Color::BrightWhite),
                intensity: Intensity::Bold,
                ..Style::default()
            },
        )
    }

    fn field_value(&self, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        ansi::paint(text, &Style::fg(Color::Fixed(248)))
    }
}

fn render_part(record: &Record, part: RecordPart, painter: &Painter) -> String {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();
    match part {
        RecordPart::Level => {
            painter.level(&format!("{:<LEVEL_WIDTH$}", record.level_name()))
        }
        RecordPart::RelativeCreated => painter.meta(&record.relative_created_ms().to_string()),
        RecordPart::LoggerName => painter.meta(record.logger_name()),
        RecordPart::FilePath => painter.meta(record.call_site().file_path()),
        RecordPart::FileName => painter.meta(record.call_site().file_name()),
        RecordPart::Lineno => painter.meta(&record.call_site().line().to_string()),
        RecordPart::FuncName => painter.meta(&or_dash(record.call_site().function())),
        RecordPart::ThreadId => painter.meta(&record.thread_id().to_string()),
        RecordPart::ThreadName => painter.meta(record.thread_name()),
        RecordPart::TaskName => painter.meta(&or_dash(record.task_name())),
        RecordPart::ProcessId => painter.meta(&record.process_id().to_string()),
        RecordPart::ProcessName => painter.meta(record.process_name()),
    }
}

/// The shared rendering engine behind the plain, color, and audit layouts.
pub(crate) fn render(record: &Record, details: &RecordDetails, colored: bool) -> String {
    let painter = Painter {
        colored,
        level_style: level_registry().style_of(record.severity()),
        color_all: details.color_all_record_fields(),
    };

    let mut parts = Vec::new();
    parts.push(painter.meta(&format_timestamp(record.timestamp(), details.datefmt())));

    match details.optional_record_fields() {
        None => {
            parts.push(render_part(record, RecordPart::Level, &painter));
        }
        Some(_) => match details.message_parts_order() {
            Some(order) => {
                for part in order {
                    parts.push(render_part(record, *part, &painter));
                }
            }
            // diagnostics-only mode keeps the level inline
            None => parts.push(render_part(record, RecordPart::Level, &painter)),
        },
    }

    parts.push(painter.message(record.message()));

    let separator = format!(" {} ", painter.separator(details.separator()));
    let mut line = parts.join(&separator);

    if !record.fields().is_empty() {
        line.push_str(" { ");
        for (i, (key, value)) in record.fields().iter().enumerate() {
            if i > 0 {
                line.push_str(", ");
            }
            // SAFETY: write to a string always succeeds
            write!(
                &mut line,
                "{} = {}",
                painter.field_key(key),
                painter.field_value(&value.to_string())
            )
            .unwrap();
        }
        line.push_str(" }");
    }

    let diagnostics = details
        .optional_record_fields()
        .copied()
        .unwrap_or_default();
    if diagnostics.exc_info {
        if let Some(exception) = record.exception() {
            line.push('\n');
            line.push_str(exception);
        }
    }
    if diagnostics.stack_info {
        if let Some(stack) = record.stack() {
            line.push('\n');
            line.push_str(stack);
        }
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::details::OptionalRecordFields;
    use crate::record::CallSite;
    use crate::record::FieldValue;
    use crate::INFO;

    fn sample_record(fields: Vec<(String, FieldValue)>) -> Record {
        Record::new(
            INFO,
            "INFO".to_string(),
            "app.api".to_string(),
            "request served".to_string(),
            fields,
            CallSite::here("/srv/app/src/api.rs", 42, Some("serve")),
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_simple_mode_shape() {
        let record = sample_record(vec![]);
        let line = render(&record, &RecordDetails::default(), false);
        let parts: Vec<&str> = line.split(" • ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "INFO    ");
        assert_eq!(parts[2], "request served");
    }

    #[test]
    fn test_strict_mode_ordering() {
        let details = RecordDetails::builder()
            .optional_fields(OptionalRecordFields {
                logger_name: true,
                file_name: true,
                lineno: true,
                ..OptionalRecordFields::default()
            })
            .message_parts_order(["logger_name", "level", "file_name", "lineno"])
            .separator('|')
            .build()
            .unwrap();
        let record = sample_record(vec![]);
        let line = render(&record, &details, false);
        let parts: Vec<&str> = line.split(" | ").collect();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[1], "app.api");
        assert_eq!(parts[2], "INFO    ");
        assert_eq!(parts[3], "api.rs");
        assert_eq!(parts[4], "42");
        assert_eq!(parts[5], "request served");
    }

    #[test]
    fn test_structured_fields_trailer() {
        let record = sample_record(vec![
            ("user".to_string(), FieldValue::from("bob")),
            ("attempts".to_string(), FieldValue::from(3)),
        ]);
        let line = render(&record, &RecordDetails::default(), false);
        assert!(line.ends_with("request served { user = 'bob', attempts = 3 }"));
    }

    #[test]
    fn test_diagnostics_appended_after_fields() {
        let details = RecordDetails::builder()
            .optional_fields(OptionalRecordFields {
                exc_info: true,
                stack_info: true,
                ..OptionalRecordFields::default()
            })
            .build()
            .unwrap();
        let record = Record::new(
            INFO,
            "INFO".to_string(),
            "app".to_string(),
            "boom".to_string(),
            vec![("k".to_string(), FieldValue::from(1))],
            CallSite::here("a.rs", 1, None),
            None,
            Some("failed to open\ncaused by: permission denied".to_string()),
            Some("stack line one\nstack line two".to_string()),
        );
        let line = render(&record, &details, false);
        let mut lines = line.lines();
        let first = lines.next().unwrap();
        assert!(first.ends_with("boom { k = 1 }"));
        assert_eq!(lines.next().unwrap(), "failed to open");
        assert_eq!(lines.next().unwrap(), "caused by: permission denied");
        assert_eq!(lines.next().unwrap(), "stack line one");
        assert_eq!(lines.next().unwrap(), "stack line two");
    }

    #[test]
    fn test_color_mode_wraps_level_and_message() {
        let record = sample_record(vec![]);
        let line = render(&record, &RecordDetails::default(), true);
        // the level style of INFO is the 256-color neon green
        assert!(line.contains("\x1b[38;5;46mINFO    \x1b[0m"));
        assert!(line.contains("\x1b[38;5;46mrequest served\x1b[0m"));
    }

    #[test]
    fn test_plain_layout_has_no_escapes() {
        let record = sample_record(vec![]);
        let bytes = PlainLayout::default().format(&record);
        assert!(!bytes.contains(&0x1b));
    }

    #[test]
    fn test_plain_layout_strips_message_ansi() {
        let record = Record::new(
            INFO,
            "INFO".to_string(),
            "app".to_string(),
            "say \x1b[31mred\x1b[0m".to_string(),
            vec![],
            CallSite::here("a.rs", 1, None),
            None,
            None,
            None,
        );
        let bytes = PlainLayout::default().format(&record);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("say red"));
        assert!(!text.contains('\x1b'));
    }
}
