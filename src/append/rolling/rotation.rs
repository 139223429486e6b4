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

use jiff::civil::Weekday;
use jiff::Span;
use jiff::Zoned;

use crate::Error;

/// When a time-based rotation fires.
///
/// SECOND, MINUTE, and HOUR rotate every `interval` units from the prior
/// boundary. The weekday variants and EVERYDAY rotate at the configured
/// time-of-day, the first time at the next occurrence after the sink opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum When {
    Second,
    Minute,
    Hour,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Everyday,
}

impl When {
    fn weekday(self) -> Option<Weekday> {
        match self {
            When::Monday => Some(Weekday::Monday),
            When::Tuesday => Some(Weekday::Tuesday),
            When::Wednesday => Some(Weekday::Wednesday),
            When::Thursday => Some(Weekday::Thursday),
            When::Friday => Some(Weekday::Friday),
            When::Saturday => Some(Weekday::Saturday),
            When::Sunday => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

/// The time-of-day anchor for daily and weekly rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct RotationTimestamp {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RotationTimestamp {
    /// A midnight anchor.
    pub const MIDNIGHT: RotationTimestamp = RotationTimestamp {
        hour: 0,
        minute: 0,
        second: 0,
    };
}

/// The unit an [`ExpirationRule`] interval is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ExpirationScale {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl ExpirationScale {
    fn seconds(self) -> u64 {
        match self {
            ExpirationScale::Seconds => 1,
            ExpirationScale::Minutes => 60,
            ExpirationScale::Hours => 3_600,
            ExpirationScale::Days => 86_400,
        }
    }
}

/// Age-based retention: rotated files older than `interval × scale` are
/// deleted by the sweep that follows a rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationRule {
    scale: ExpirationScale,
    interval: u64,
}

impl ExpirationRule {
    /// Build a rule; the interval must be at least one.
    pub fn new(scale: ExpirationScale, interval: u64) -> Result<ExpirationRule, Error> {
        if interval == 0 {
            return Err(Error::invalid_config(
                "expiration_rule interval must be at least 1",
            ));
        }
        Ok(ExpirationRule { scale, interval })
    }

    /// The rule's age bound in seconds.
    pub fn max_age_seconds(&self) -> u64 {
        self.scale.seconds() * self.interval
    }
}

/// How a rotating file sink rolls over and retains files.
///
/// At least one of the size trigger (`max_bytes`) and the time trigger
/// (`when`) must be configured; when both are set, rotation occurs when
/// either condition is met. `backup_count` caps the number of rotated files
/// regardless of age; the optional [`ExpirationRule`] deletes rotated files
/// by age after each rollover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationLogic {
    max_bytes: Option<u64>,
    when: Option<When>,
    interval: u64,
    timestamp: RotationTimestamp,
    backup_count: u32,
    expiration_rule: Option<ExpirationRule>,
    append_filename_pid: bool,
    append_filename_timestamp: bool,
}

impl RotationLogic {
    /// Start building a [`RotationLogic`].
    #[must_use]
    pub fn builder() -> RotationLogicBuilder {
        RotationLogicBuilder {
            max_bytes: None,
            when: None,
            interval: 1,
            timestamp: RotationTimestamp::MIDNIGHT,
            backup_count: 5,
            expiration_rule: None,
            append_filename_pid: false,
            append_filename_timestamp: false,
        }
    }

    pub(crate) fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    pub(crate) fn backup_count(&self) -> u32 {
        self.backup_count
    }

    pub(crate) fn expiration_rule(&self) -> Option<&ExpirationRule> {
        self.expiration_rule.as_ref()
    }

    pub(crate) fn append_filename_pid(&self) -> bool {
        self.append_filename_pid
    }

    pub(crate) fn append_filename_timestamp(&self) -> bool {
        self.append_filename_timestamp
    }

    /// The full rotation period in seconds, used to detect an active file
    /// left stale by a previous run.
    pub(crate) fn period_seconds(&self) -> Option<u64> {
        let when = self.when?;
        let seconds = match when {
            When::Second => self.interval,
            When::Minute => self.interval * 60,
            When::Hour => self.interval * 3_600,
            When::Everyday => 86_400,
            _ => 7 * 86_400,
        };
        Some(seconds)
    }

    /// The next rotation boundary after `now`, as epoch milliseconds, or
    /// `None` when no time trigger is configured.
    pub(crate) fn next_rollover(&self, now: &Zoned) -> Option<i64> {
        let when = self.when?;

        let next = match when {
            When::Second => now
                .checked_add(Span::new().seconds(self.interval as i64))
                .expect("rotation boundary arithmetic overflowed"),
            When::Minute => now
                .checked_add(Span::new().minutes(self.interval as i64))
                .expect("rotation boundary arithmetic overflowed"),
            When::Hour => now
                .checked_add(Span::new().hours(self.interval as i64))
                .expect("rotation boundary arithmetic overflowed"),
            When::Everyday => {
                let target = self.at_anchor(now);
                if target <= *now {
                    target
                        .checked_add(Span::new().days(1))
                        .expect("rotation boundary arithmetic overflowed")
                } else {
                    target
                }
            }
            _ => {
                let weekday = when.weekday().expect("weekday variant");
                let target = self.at_anchor(now);
                let days_ahead = now.weekday().until(weekday) as i64;
                let days_ahead = days_ahead.rem_euclid(7);
                if days_ahead == 0 && target <= *now {
                    target
                        .checked_add(Span::new().days(7))
                        .expect("rotation boundary arithmetic overflowed")
                } else {
                    target
                        .checked_add(Span::new().days(days_ahead))
                        .expect("rotation boundary arithmetic overflowed")
                }
            }
        };

        Some(next.timestamp().as_millisecond())
    }

    fn at_anchor(&self, now: &Zoned) -> Zoned {
        now.with()
            .hour(self.timestamp.hour as i8)
            .minute(self.timestamp.minute as i8)
            .second(self.timestamp.second as i8)
            .subsec_nanosecond(0)
            .build()
            .expect("rotation anchor is a valid wall time")
    }
}

/// A builder for [`RotationLogic`]; [`RotationLogicBuilder::build`] validates
/// the combination.
#[derive(Debug, Clone)]
pub struct RotationLogicBuilder {
    max_bytes: Option<u64>,
    when: Option<When>,
    interval: u64,
    timestamp: RotationTimestamp,
    backup_count: u32,
    expiration_rule: Option<ExpirationRule>,
    append_filename_pid: bool,
    append_filename_timestamp: bool,
}

impl RotationLogicBuilder {
    /// Rotate when the active file would grow past `n` bytes.
    #[must_use]
    pub fn max_bytes(mut self, n: u64) -> Self {
        self.max_bytes = Some(n);
        self
    }

    /// Set the time-based rotation mode.
    #[must_use]
    pub fn when(mut self, when: When) -> Self {
        self.when = Some(when);
        self
    }

    /// Set the interval for SECOND/MINUTE/HOUR rotation.
    #[must_use]
    pub fn interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Set the time-of-day anchor for daily and weekly rotation.
    #[must_use]
    pub fn timestamp(mut self, timestamp: RotationTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Cap the number of rotated files to keep.
    #[must_use]
    pub fn backup_count(mut self, n: u32) -> Self {
        self.backup_count = n;
        self
    }

    /// Delete rotated files older than the rule after each rollover.
    #[must_use]
    pub fn expiration_rule(mut self, rule: ExpirationRule) -> Self {
        self.expiration_rule = Some(rule);
        self
    }

    /// Insert `.PID` before the file extension when the sink opens.
    #[must_use]
    pub fn append_filename_pid(mut self, enabled: bool) -> Self {
        self.append_filename_pid = enabled;
        self
    }

    /// Insert `_YYYYMMDD_HHMMSS` before the file extension when the sink
    /// opens.
    #[must_use]
    pub fn append_filename_timestamp(mut self, enabled: bool) -> Self {
        self.append_filename_timestamp = enabled;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<RotationLogic, Error> {
        if self.max_bytes.is_none() && self.when.is_none() {
            return Err(Error::invalid_config(
                "rotation requires at least one of max_bytes and when",
            ));
        }
        if self.max_bytes == Some(0) {
            return Err(Error::invalid_config("max_bytes must be positive"));
        }
        if self.interval == 0 {
            return Err(Error::invalid_config("interval must be at least 1"));
        }
        if self.timestamp.hour > 23 || self.timestamp.minute > 59 || self.timestamp.second > 59 {
            return Err(Error::invalid_config(
                "timestamp must be a valid time of day",
            ));
        }
        Ok(RotationLogic {
            max_bytes: self.max_bytes,
            when: self.when,
            interval: self.interval,
            timestamp: self.timestamp,
            backup_count: self.backup_count,
            expiration_rule: self.expiration_rule,
            append_filename_pid: self.append_filename_pid,
            append_filename_timestamp: self.append_filename_timestamp,
        })
    }
}
