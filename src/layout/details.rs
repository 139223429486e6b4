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

use jiff::Zoned;

use crate::Error;

/// The default date format: second-of-day with millisecond fraction.
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S.%3f";

/// The default field separator.
pub const DEFAULT_SEPARATOR: char = '•';

/// Selects which optional record fields may appear between the timestamp and
/// the message. The mandatory fields (timestamp, level, message) are not
/// listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct OptionalRecordFields {
    pub relative_created: bool,
    pub logger_name: bool,
    pub file_path: bool,
    pub file_name: bool,
    pub lineno: bool,
    pub func_name: bool,
    pub thread_id: bool,
    pub thread_name: bool,
    pub task_name: bool,
    pub process_id: bool,
    pub process_name: bool,

    // diagnostics, appended after the first line rather than inline
    pub exc_info: bool,
    pub stack_info: bool,
}

impl OptionalRecordFields {
    fn inline_flags(&self) -> [(RecordPart, bool); 11] {
        [
            (RecordPart::RelativeCreated, self.relative_created),
            (RecordPart::LoggerName, self.logger_name),
            (RecordPart::FilePath, self.file_path),
            (RecordPart::FileName, self.file_name),
            (RecordPart::Lineno, self.lineno),
            (RecordPart::FuncName, self.func_name),
            (RecordPart::ThreadId, self.thread_id),
            (RecordPart::ThreadName, self.thread_name),
            (RecordPart::TaskName, self.task_name),
            (RecordPart::ProcessId, self.process_id),
            (RecordPart::ProcessName, self.process_name),
        ]
    }

    fn any_inline(&self) -> bool {
        self.inline_flags().iter().any(|(_, enabled)| *enabled)
    }

    fn any_diagnostics(&self) -> bool {
        self.exc_info || self.stack_info
    }
}

/// One token of the message-parts order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RecordPart {
    Level,
    RelativeCreated,
    LoggerName,
    FilePath,
    FileName,
    Lineno,
    FuncName,
    ThreadId,
    ThreadName,
    TaskName,
    ProcessId,
    ProcessName,
}

impl RecordPart {
    fn parse(token: &str) -> Result<RecordPart, Error> {
        match token {
            "level" => Ok(RecordPart::Level),
            "relative_created" => Ok(RecordPart::RelativeCreated),
            "logger_name" => Ok(RecordPart::LoggerName),
            "file_path" => Ok(RecordPart::FilePath),
            "file_name" => Ok(RecordPart::FileName),
            "lineno" => Ok(RecordPart::Lineno),
            "func_name" => Ok(RecordPart::FuncName),
            "thread_id" => Ok(RecordPart::ThreadId),
            "thread_name" => Ok(RecordPart::ThreadName),
            "task_name" => Ok(RecordPart::TaskName),
            "process_id" => Ok(RecordPart::ProcessId),
            "process_name" => Ok(RecordPart::ProcessName),
            "timestamp" | "message" => Err(Error::invalid_config(format!(
                "{token:?} must not appear in message_parts_order; it is always rendered in its fixed position"
            ))),
            "exc_info" | "stack_info" => Err(Error::invalid_config(format!(
                "diagnostics field {token:?} must not appear in message_parts_order"
            ))),
            _ => Err(Error::invalid_config(format!(
                "unknown message part {token:?}"
            ))),
        }
    }

    /// The token string this part parses from.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordPart::Level => "level",
            RecordPart::RelativeCreated => "relative_created",
            RecordPart::LoggerName => "logger_name",
            RecordPart::FilePath => "file_path",
            RecordPart::FileName => "file_name",
            RecordPart::Lineno => "lineno",
            RecordPart::FuncName => "func_name",
            RecordPart::ThreadId => "thread_id",
            RecordPart::ThreadName => "thread_name",
            RecordPart::TaskName => "task_name",
            RecordPart::ProcessId => "process_id",
            RecordPart::ProcessName => "process_name",
        }
    }
}

/// Declarative formatting configuration for a sink.
///
/// The rendered line always places the timestamp first and the message last.
/// In simple mode (no optional fields) the line is
/// `timestamp SEP LEVEL SEP message`. In strict mode the configured middle
/// fields appear between them, in the declared order, joined by the separator
/// surrounded by single spaces.
///
/// All invariants are enforced at construction:
///
/// - the separator is a single non-alphanumeric, non-bracket character;
/// - `%1f`..`%6f` are the only fractional-second directives accepted in the
///   date format, and the rest of the format must parse;
/// - `level` appears exactly once in a non-empty order;
/// - every ordered token is `level` or an optional field enabled in the
///   bitset, and every enabled inline field appears exactly once;
/// - `timestamp`, `message`, and the diagnostics tokens never appear in the
///   order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDetails {
    datefmt: String,
    separator: char,
    optional_record_fields: Option<OptionalRecordFields>,
    message_parts_order: Option<Vec<RecordPart>>,
    color_all_record_fields: bool,
}

impl Default for RecordDetails {
    fn default() -> Self {
        RecordDetails {
            datefmt: DEFAULT_DATEFMT.to_string(),
            separator: DEFAULT_SEPARATOR,
            optional_record_fields: None,
            message_parts_order: None,
            color_all_record_fields: false,
        }
    }
}

impl RecordDetails {
    /// Start building a [`RecordDetails`].
    #[must_use]
    pub fn builder() -> RecordDetailsBuilder {
        RecordDetailsBuilder {
            datefmt: DEFAULT_DATEFMT.to_string(),
            separator: DEFAULT_SEPARATOR,
            optional_record_fields: None,
            message_parts_order: None,
            color_all_record_fields: false,
        }
    }

    pub(crate) fn datefmt(&self) -> &str {
        &self.datefmt
    }

    pub(crate) fn separator(&self) -> char {
        self.separator
    }

    pub(crate) fn optional_record_fields(&self) -> Option<&OptionalRecordFields> {
        self.optional_record_fields.as_ref()
    }

    pub(crate) fn message_parts_order(&self) -> Option<&[RecordPart]> {
        self.message_parts_order.as_deref()
    }

    pub(crate) fn color_all_record_fields(&self) -> bool {
        self.color_all_record_fields
    }
}

/// A builder for [`RecordDetails`]; [`RecordDetailsBuilder::build`] runs the
/// full validation.
#[derive(Debug, Clone)]
pub struct RecordDetailsBuilder {
    datefmt: String,
    separator: char,
    optional_record_fields: Option<OptionalRecordFields>,
    message_parts_order: Option<Vec<String>>,
    color_all_record_fields: bool,
}

impl RecordDetailsBuilder {
    /// Set the strftime date format. `%1f`..`%6f` expand to that many
    /// zero-padded fractional-second digits.
    #[must_use]
    pub fn datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = datefmt.into();
        self
    }

    /// Set the single-character field separator.
    #[must_use]
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Enable optional record fields (switches the layout to strict mode).
    #[must_use]
    pub fn optional_fields(mut self, fields: OptionalRecordFields) -> Self {
        self.optional_record_fields = Some(fields);
        self
    }

    /// Declare the order of the middle fields by token name.
    #[must_use]
    pub fn message_parts_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.message_parts_order = Some(
            order
                .into_iter()
                .map(|token| token.as_ref().to_string())
                .collect(),
        );
        self
    }

    /// Color every middle field with a dim variant of the level style instead
    /// of the default dim rendering.
    #[must_use]
    pub fn color_all_record_fields(mut self, enabled: bool) -> Self {
        self.color_all_record_fields = enabled;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<RecordDetails, Error> {
        if self.separator.is_alphanumeric() || "{}[]()<>".contains(self.separator) {
            return Err(Error::invalid_config(format!(
                "separator {:?} must be non-alphanumeric and non-bracket",
                self.separator
            )));
        }
        validate_datefmt(&self.datefmt)?;

        let Some(fields) = self.optional_record_fields else {
            // simple mode
            if self.message_parts_order.is_some() {
                return Err(Error::invalid_config(
                    "message_parts_order requires optional record fields to be set",
                ));
            }
            if self.color_all_record_fields {
                return Err(Error::invalid_config(
                    "color_all_record_fields requires optional record fields to be set",
                ));
            }
            return Ok(RecordDetails {
                datefmt: self.datefmt,
                separator: self.separator,
                optional_record_fields: None,
                message_parts_order: None,
                color_all_record_fields: false,
            });
        };

        let inline_enabled = fields.any_inline();
        if !inline_enabled && fields.any_diagnostics() {
            if self.message_parts_order.is_some() {
                return Err(Error::invalid_config(
                    "message_parts_order must be absent when only diagnostics fields are enabled",
                ));
            }
            return Ok(RecordDetails {
                datefmt: self.datefmt,
                separator: self.separator,
                optional_record_fields: Some(fields),
                message_parts_order: None,
                color_all_record_fields: self.color_all_record_fields,
            });
        }
        if !inline_enabled {
            return Err(Error::invalid_config(
                "at least one optional record field must be enabled",
            ));
        }
        let Some(order) = self.message_parts_order else {
            return Err(Error::invalid_config(
                "message_parts_order is required when inline optional fields are enabled",
            ));
        };

        let order = order
            .iter()
            .map(|token| RecordPart::parse(token))
            .collect::<Result<Vec<_>, _>>()?;

        let level_count = order
            .iter()
            .filter(|part| **part == RecordPart::Level)
            .count();
        if level_count != 1 {
            return Err(Error::invalid_config(
                "message_parts_order must contain 'level' exactly once",
            ));
        }

        for (part, enabled) in fields.inline_flags() {
            let count = order.iter().filter(|p| **p == part).count();
            if enabled && count != 1 {
                return Err(Error::invalid_config(format!(
                    "optional field {:?} is enabled but not present exactly once in message_parts_order",
                    part.as_str()
                )));
            }
            if !enabled && count != 0 {
                return Err(Error::invalid_config(format!(
                    "optional field {:?} appears in message_parts_order but is disabled",
                    part.as_str()
                )));
            }
        }

        Ok(RecordDetails {
            datefmt: self.datefmt,
            separator: self.separator,
            optional_record_fields: Some(fields),
            message_parts_order: Some(order),
            color_all_record_fields: self.color_all_record_fields,
        })
    }
}

/// Expands `%1f`..`%6f` into literal fractional-second digits so the rest of
/// the format can go through strftime untouched. `%%` escapes are preserved.
fn expand_fractional(datefmt: &str, subsec_nanos: i32) -> String {
    let micros = format!("{:06}", subsec_nanos / 1_000);
    let mut out = String::with_capacity(datefmt.len());
    let mut chars = datefmt.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                out.push('%');
                out.push('%');
                chars.next();
            }
            Some(&(digit @ '1'..='6')) => {
                // lookahead for the closing 'f'
                let mut rest = chars.clone();
                rest.next();
                if rest.peek() == Some(&'f') {
                    let width = digit as usize - '0' as usize;
                    out.push_str(&micros[..width]);
                    chars.next();
                    chars.next();
                } else {
                    out.push('%');
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

/// Renders `timestamp` with `datefmt`, expanding the fractional directives.
///
/// The format has been validated at construction time, so rendering is total;
/// an unexpected strftime failure falls back to the default format.
pub(crate) fn format_timestamp(timestamp: &Zoned, datefmt: &str) -> String {
    let expanded = expand_fractional(datefmt, timestamp.subsec_nanosecond());
    jiff::fmt::strtime::format(&expanded, timestamp).unwrap_or_else(|_| {
        let fallback = expand_fractional(DEFAULT_DATEFMT, timestamp.subsec_nanosecond());
        jiff::fmt::strtime::format(&fallback, timestamp).unwrap_or_default()
    })
}

fn validate_datefmt(datefmt: &str) -> Result<(), Error> {
    let mut chars = datefmt.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
            }
            Some(&digit) if digit.is_ascii_digit() => {
                let mut rest = chars.clone();
                rest.next();
                if rest.peek() == Some(&'f') && !('1'..='6').contains(&digit) {
                    return Err(Error::invalid_config(format!(
                        "invalid fractional seconds directive \"%{digit}f\"; only %1f through %6f are supported"
                    )));
                }
            }
            _ => {}
        }
    }

    // trial render to reject directives strftime itself does not know
    let expanded = expand_fractional(datefmt, 0);
    jiff::fmt::strtime::format(&expanded, &Zoned::now()).map_err(|err| {
        Error::invalid_config(format!("date format {datefmt:?} does not parse: {err}"))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_disabled() -> OptionalRecordFields {
        OptionalRecordFields::default()
    }

    #[test]
    fn test_default_details_are_simple_mode() {
        let details = RecordDetails::default();
        assert!(details.optional_record_fields().is_none());
        assert!(details.message_parts_order().is_none());
    }

    #[test]
    fn test_separator_validation() {
        for sep in ['a', '3', '[', '<', '}'] {
            let err = RecordDetails::builder().separator(sep).build().unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{sep:?}");
        }
        for sep in ['|', '•', '#', '-'] {
            RecordDetails::builder().separator(sep).build().unwrap();
        }
    }

    #[test]
    fn test_fractional_directives() {
        RecordDetails::builder()
            .datefmt("%H:%M:%S.%6f")
            .build()
            .unwrap();
        for bad in ["%H:%M:%S.%7f", "%0f", "%9f"] {
            let err = RecordDetails::builder().datefmt(bad).build().unwrap_err();
            let message = err.to_string();
            assert!(message.contains('f'), "{message}");
        }
    }

    #[test]
    fn test_unknown_strftime_directive_rejected() {
        let err = RecordDetails::builder()
            .datefmt("%Y-%Q")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_order_requires_optional_fields() {
        let err = RecordDetails::builder()
            .message_parts_order(["level"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_timestamp_and_message_rejected_in_order() {
        let fields = OptionalRecordFields {
            lineno: true,
            ..all_disabled()
        };
        for token in ["timestamp", "message"] {
            let err = RecordDetails::builder()
                .optional_fields(fields)
                .message_parts_order([token, "level", "lineno"])
                .build()
                .unwrap_err();
            assert!(err.to_string().contains(token));
        }
    }

    #[test]
    fn test_level_required_exactly_once() {
        let fields = OptionalRecordFields {
            lineno: true,
            ..all_disabled()
        };
        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["lineno"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("level"));

        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["level", "lineno", "level"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("level"));
    }

    #[test]
    fn test_disabled_field_in_order_rejected() {
        let fields = OptionalRecordFields {
            lineno: false,
            func_name: true,
            ..all_disabled()
        };
        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["lineno", "level", "func_name"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("lineno"));
    }

    #[test]
    fn test_enabled_field_missing_from_order_rejected() {
        let fields = OptionalRecordFields {
            lineno: true,
            func_name: true,
            ..all_disabled()
        };
        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["level", "lineno"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("func_name"));
    }

    #[test]
    fn test_diagnostics_tokens_rejected_in_order() {
        let fields = OptionalRecordFields {
            lineno: true,
            exc_info: true,
            ..all_disabled()
        };
        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["level", "lineno", "exc_info"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("exc_info"));
    }

    #[test]
    fn test_diagnostics_only_mode() {
        let fields = OptionalRecordFields {
            exc_info: true,
            stack_info: true,
            ..all_disabled()
        };
        let details = RecordDetails::builder()
            .optional_fields(fields)
            .build()
            .unwrap();
        assert!(details.message_parts_order().is_none());

        let err = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["level"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_valid_strict_configuration() {
        let fields = OptionalRecordFields {
            logger_name: true,
            lineno: true,
            ..all_disabled()
        };
        let details = RecordDetails::builder()
            .optional_fields(fields)
            .message_parts_order(["logger_name", "level", "lineno"])
            .separator('|')
            .build()
            .unwrap();
        assert_eq!(
            details.message_parts_order().unwrap(),
            &[
                RecordPart::LoggerName,
                RecordPart::Level,
                RecordPart::Lineno
            ]
        );
    }

    #[test]
    fn test_expand_fractional() {
        assert_eq!(expand_fractional("%S.%3f", 123_456_789), "%S.123");
        assert_eq!(expand_fractional("%S.%6f", 123_456_789), "%S.123456");
        assert_eq!(expand_fractional("%S.%1f", 987_000_000), "%S.9");
        // escaped percent is preserved
        assert_eq!(expand_fractional("100%%3f", 0), "100%%3f");
    }

    #[test]
    fn test_format_timestamp_fraction_width() {
        let timestamp: Zoned = "2024-08-10T17:12:52.123456789[UTC]".parse().unwrap();
        assert_eq!(
            format_timestamp(&timestamp, "%Y-%m-%d %H:%M:%S.%3f"),
            "2024-08-10 17:12:52.123"
        );
        assert_eq!(format_timestamp(&timestamp, "%H:%M:%S.%6f"), "17:12:52.123456");
    }
}
