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

//! Severities, level styles, and the process-wide level registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use parking_lot::Mutex;

use crate::ansi::Color;
use crate::ansi::Intensity;
use crate::ansi::TextStyles;
use crate::Error;

/// A numeric log severity. Higher is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Severity(
    /// The numeric value.
    pub u32,
);

/// The inherit sentinel: a logger at NOTSET resolves its severity from the
/// nearest ancestor with an explicit one.
pub const NOTSET: Severity = Severity(0);
/// Very low priority, often extremely verbose, information.
pub const TRACE: Severity = Severity(5);
/// Lower priority information.
pub const DEBUG: Severity = Severity(10);
/// Useful information.
pub const INFO: Severity = Severity(20);
/// Hazardous situations.
pub const WARNING: Severity = Severity(30);
/// Serious errors.
pub const ERROR: Severity = Severity(40);
/// Errors the process may not survive.
pub const CRITICAL: Severity = Severity(50);

impl Severity {
    /// Whether this severity is the inherit sentinel.
    pub fn is_notset(self) -> bool {
        self == NOTSET
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a level is colored by the console formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStyle {
    /// Foreground color.
    pub fg: Color,
    /// Optional background color.
    pub bg: Option<Color>,
    /// Intensity.
    pub intensity: Intensity,
    /// Decorations.
    pub styles: TextStyles,
}

impl LevelStyle {
    /// A foreground-only style at normal intensity.
    pub const fn fg(fg: Color) -> LevelStyle {
        LevelStyle {
            fg,
            bg: None,
            intensity: Intensity::Normal,
            styles: TextStyles::NONE,
        }
    }
}

#[derive(Debug, Clone)]
struct LevelEntry {
    name: String,
    severity: Severity,
    style: LevelStyle,
    default_style: LevelStyle,
}

/// The process-wide mapping from level name to severity and style.
///
/// Obtain it with [`level_registry`]. All reads snapshot under the registry
/// mutex; registration and theming are serialized.
#[derive(Debug)]
pub struct LevelRegistry {
    levels: Mutex<Vec<LevelEntry>>,
}

static REGISTRY: LazyLock<LevelRegistry> = LazyLock::new(|| {
    let registry = LevelRegistry {
        levels: Mutex::new(Vec::new()),
    };
    for (name, severity, style) in builtin_levels() {
        registry
            .register(name, severity, style)
            .expect("built-in levels are valid");
    }
    registry
});

fn builtin_levels() -> [(&'static str, Severity, LevelStyle); 6] {
    [
        ("TRACE", TRACE, LevelStyle::fg(Color::Fixed(141))),
        ("DEBUG", DEBUG, LevelStyle::fg(Color::Cyan)),
        ("INFO", INFO, LevelStyle::fg(Color::Fixed(46))),
        ("WARNING", WARNING, LevelStyle::fg(Color::Fixed(226))),
        (
            "ERROR",
            ERROR,
            LevelStyle {
                fg: Color::Fixed(196),
                bg: None,
                intensity: Intensity::Bold,
                styles: TextStyles::NONE,
            },
        ),
        (
            "CRITICAL",
            CRITICAL,
            LevelStyle {
                fg: Color::Fixed(226),
                bg: Some(Color::Fixed(196)),
                intensity: Intensity::Bold,
                styles: TextStyles::UNDERLINE,
            },
        ),
    ]
}

/// Access the process-wide level registry, initializing it with the built-in
/// levels on first use.
pub fn level_registry() -> &'static LevelRegistry {
    &REGISTRY
}

fn validate_level_name(name: &str) -> Result<(), Error> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            name.len() >= 2 && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "level name {name:?} must be uppercase letters, digits, and underscores"
        )))
    }
}

impl LevelRegistry {
    /// Add a level.
    ///
    /// Registering a name that already exists with the identical severity is a
    /// no-op; with a different severity it is a [`Error::NameConflict`]. A
    /// severity already assigned to another level is rejected as well. Use
    /// [`LevelRegistry::override_level`] to replace an existing level.
    pub fn register(
        &self,
        name: &str,
        severity: Severity,
        style: LevelStyle,
    ) -> Result<(), Error> {
        validate_level_name(name)?;

        let mut levels = self.levels.lock();
        if let Some(existing) = levels.iter().find(|entry| entry.name == name) {
            if existing.severity == severity {
                return Ok(());
            }
            return Err(Error::name_conflict(format!(
                "level {name:?} is already registered with severity {}",
                existing.severity
            )));
        }
        if let Some(existing) = levels.iter().find(|entry| entry.severity == severity) {
            return Err(Error::name_conflict(format!(
                "severity {severity} is already assigned to level {:?}",
                existing.name
            )));
        }

        levels.push(LevelEntry {
            name: name.to_string(),
            severity,
            style,
            default_style: style,
        });
        Ok(())
    }

    /// Replace an existing level's severity and style atomically.
    pub fn override_level(
        &self,
        name: &str,
        severity: Severity,
        style: LevelStyle,
    ) -> Result<(), Error> {
        validate_level_name(name)?;

        let mut levels = self.levels.lock();
        if let Some(taken) = levels
            .iter()
            .find(|entry| entry.severity == severity && entry.name != name)
        {
            return Err(Error::name_conflict(format!(
                "severity {severity} is already assigned to level {:?}",
                taken.name
            )));
        }
        match levels.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.severity = severity;
                entry.style = style;
                entry.default_style = style;
                Ok(())
            }
            None => Err(Error::name_conflict(format!(
                "level {name:?} is not registered"
            ))),
        }
    }

    /// Replace each known level's style from `theme`, keyed by severity.
    ///
    /// Passing `None` restores the styles the levels were registered with.
    /// Levels absent from the theme keep their current style.
    pub fn apply_theme(&self, theme: Option<&HashMap<Severity, LevelStyle>>) {
        let mut levels = self.levels.lock();
        match theme {
            None => {
                for entry in levels.iter_mut() {
                    entry.style = entry.default_style;
                }
            }
            Some(theme) => {
                for entry in levels.iter_mut() {
                    if let Some(style) = theme.get(&entry.severity) {
                        entry.style = *style;
                    }
                }
            }
        }
    }

    /// A snapshot of the name→severity mapping, including the NOTSET sentinel.
    pub fn snapshot(&self) -> HashMap<String, Severity> {
        let levels = self.levels.lock();
        let mut out = HashMap::with_capacity(levels.len() + 1);
        out.insert("NOTSET".to_string(), NOTSET);
        for entry in levels.iter() {
            out.insert(entry.name.clone(), entry.severity);
        }
        out
    }

    /// The severity registered under `name`, if any. Lookup is
    /// case-insensitive so the shorthand macros can key on lowercase names.
    pub fn severity_of(&self, name: &str) -> Option<Severity> {
        let levels = self.levels.lock();
        levels
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.severity)
    }

    /// The name registered for `severity`, if any.
    pub fn name_of(&self, severity: Severity) -> Option<String> {
        let levels = self.levels.lock();
        levels
            .iter()
            .find(|entry| entry.severity == severity)
            .map(|entry| entry.name.clone())
    }

    /// The current style for `severity`, if any level carries it.
    pub fn style_of(&self, severity: Severity) -> Option<LevelStyle> {
        let levels = self.levels.lock();
        levels
            .iter()
            .find(|entry| entry.severity == severity)
            .map(|entry| entry.style)
    }
}

/// Add a level to the process-wide registry. See [`LevelRegistry::register`].
pub fn register_level(name: &str, severity: Severity, style: LevelStyle) -> Result<(), Error> {
    level_registry().register(name, severity, style)
}

/// Replace an existing level's severity and style. See
/// [`LevelRegistry::override_level`].
pub fn override_level(name: &str, severity: Severity, style: LevelStyle) -> Result<(), Error> {
    level_registry().override_level(name, severity, style)
}

/// Replace each known level's style from a severity-keyed theme; `None`
/// restores the defaults. See [`LevelRegistry::apply_theme`].
pub fn apply_color_theme(theme: Option<&HashMap<Severity, LevelStyle>>) {
    level_registry().apply_theme(theme)
}

/// A snapshot of the registered levels as a name→severity map.
pub fn levels() -> HashMap<String, Severity> {
    level_registry().snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_present() {
        let snapshot = level_registry().snapshot();
        assert_eq!(snapshot["TRACE"], TRACE);
        assert_eq!(snapshot["DEBUG"], DEBUG);
        assert_eq!(snapshot["INFO"], INFO);
        assert_eq!(snapshot["WARNING"], WARNING);
        assert_eq!(snapshot["ERROR"], ERROR);
        assert_eq!(snapshot["CRITICAL"], CRITICAL);
        assert_eq!(snapshot["NOTSET"], NOTSET);
    }

    #[test]
    fn test_reregister_identical_severity_is_noop() {
        level_registry()
            .register("INFO", INFO, LevelStyle::fg(Color::Green))
            .unwrap();
        // the original style is untouched
        assert_eq!(
            level_registry().style_of(INFO).unwrap().fg,
            Color::Fixed(46)
        );
    }

    #[test]
    fn test_register_conflicting_severity_fails() {
        let err = level_registry()
            .register("INFO", Severity(21), LevelStyle::fg(Color::Green))
            .unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
    }

    #[test]
    fn test_register_taken_severity_value_fails() {
        let err = level_registry()
            .register("ALSO_INFO", INFO, LevelStyle::fg(Color::Green))
            .unwrap_err();
        assert!(matches!(err, Error::NameConflict(_)));
    }

    #[test]
    fn test_register_custom_level() {
        level_registry()
            .register("NOTICE", Severity(25), LevelStyle::fg(Color::Fixed(208)))
            .unwrap();
        assert_eq!(level_registry().severity_of("notice"), Some(Severity(25)));
        assert_eq!(
            level_registry().name_of(Severity(25)).as_deref(),
            Some("NOTICE")
        );
    }

    #[test]
    fn test_invalid_level_names_rejected() {
        let registry = level_registry();
        for name in ["notice", "N", "9OTICE", "NO TICE", ""] {
            let err = registry
                .register(name, Severity(99), LevelStyle::fg(Color::Red))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{name:?}");
        }
    }

    #[test]
    fn test_theme_roundtrip() {
        let registry = level_registry();
        let mut theme = HashMap::new();
        theme.insert(WARNING, LevelStyle::fg(Color::Fixed(201)));
        registry.apply_theme(Some(&theme));
        assert_eq!(registry.style_of(WARNING).unwrap().fg, Color::Fixed(201));

        registry.apply_theme(None);
        assert_eq!(registry.style_of(WARNING).unwrap().fg, Color::Fixed(226));
    }
}
