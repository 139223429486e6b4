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

//! ANSI escape rendering.
//!
//! Pure functions over styled text fragments. Foreground colors render as
//! `ESC[38;5;Nm` for 256-color indices or the basic SGR codes, backgrounds as
//! `ESC[48;5;Nm`, and every painted fragment is closed with `ESC[0m`.

use std::fmt::Write;

const RESET: &str = "\x1b[0m";

/// A terminal color.
///
/// The named variants map to the basic 16-color SGR codes; [`Color::Fixed`]
/// selects an index in the xterm-256 palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Basic black.
    Black,
    /// Basic red.
    Red,
    /// Basic green.
    Green,
    /// Basic yellow.
    Yellow,
    /// Basic blue.
    Blue,
    /// Basic magenta.
    Magenta,
    /// Basic cyan.
    Cyan,
    /// Basic white.
    White,
    /// Bright black (grey).
    BrightBlack,
    /// Bright red.
    BrightRed,
    /// Bright green.
    BrightGreen,
    /// Bright yellow.
    BrightYellow,
    /// Bright blue.
    BrightBlue,
    /// Bright magenta.
    BrightMagenta,
    /// Bright cyan.
    BrightCyan,
    /// Bright white.
    BrightWhite,
    /// An index into the xterm-256 palette.
    Fixed(u8),
}

impl Color {
    fn basic_offset(self) -> Option<u8> {
        match self {
            Color::Black => Some(0),
            Color::Red => Some(1),
            Color::Green => Some(2),
            Color::Yellow => Some(3),
            Color::Blue => Some(4),
            Color::Magenta => Some(5),
            Color::Cyan => Some(6),
            Color::White => Some(7),
            Color::BrightBlack => Some(60),
            Color::BrightRed => Some(61),
            Color::BrightGreen => Some(62),
            Color::BrightYellow => Some(63),
            Color::BrightBlue => Some(64),
            Color::BrightMagenta => Some(65),
            Color::BrightCyan => Some(66),
            Color::BrightWhite => Some(67),
            Color::Fixed(_) => None,
        }
    }

    pub(crate) fn fg_code(self) -> String {
        match self.basic_offset() {
            Some(offset) => (30 + offset).to_string(),
            None => match self {
                Color::Fixed(n) => format!("38;5;{n}"),
                _ => unreachable!(),
            },
        }
    }

    pub(crate) fn bg_code(self) -> String {
        match self.basic_offset() {
            Some(offset) => (40 + offset).to_string(),
            None => match self {
                Color::Fixed(n) => format!("48;5;{n}"),
                _ => unreachable!(),
            },
        }
    }
}

/// The weight of a styled fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Intensity {
    /// No intensity code is emitted.
    #[default]
    Normal,
    /// `ESC[1m`.
    Bold,
    /// `ESC[2m`.
    Dim,
}

/// Additional text decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextStyles {
    /// `ESC[4m`.
    pub underline: bool,
    /// `ESC[3m`.
    pub italic: bool,
    /// `ESC[9m`.
    pub strike: bool,
}

impl TextStyles {
    /// No decorations.
    pub const NONE: TextStyles = TextStyles {
        underline: false,
        italic: false,
        strike: false,
    };

    /// Underline only.
    pub const UNDERLINE: TextStyles = TextStyles {
        underline: true,
        italic: false,
        strike: false,
    };
}

/// A complete style for one text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Intensity.
    pub intensity: Intensity,
    /// Decorations.
    pub styles: TextStyles,
}

impl Style {
    /// A style that paints only the foreground.
    pub fn fg(color: Color) -> Style {
        Style {
            fg: Some(color),
            ..Style::default()
        }
    }

    /// A dim style with no explicit color.
    pub fn dim() -> Style {
        Style {
            intensity: Intensity::Dim,
            ..Style::default()
        }
    }

    fn codes(&self) -> String {
        let mut codes = Vec::new();
        match self.intensity {
            Intensity::Normal => {}
            Intensity::Bold => codes.push("1".to_string()),
            Intensity::Dim => codes.push("2".to_string()),
        }
        if let Some(fg) = self.fg {
            codes.push(fg.fg_code());
        }
        if let Some(bg) = self.bg {
            codes.push(bg.bg_code());
        }
        if self.styles.italic {
            codes.push("3".to_string());
        }
        if self.styles.underline {
            codes.push("4".to_string());
        }
        if self.styles.strike {
            codes.push("9".to_string());
        }
        codes.join(";")
    }
}

/// Wraps `text` with the escape codes of `style` and a trailing reset.
///
/// An empty style returns the text unchanged.
pub fn paint(text: &str, style: &Style) -> String {
    let codes = style.codes();
    if codes.is_empty() {
        return text.to_string();
    }
    format!("\x1b[{codes}m{text}{RESET}")
}

/// Removes every `ESC[...<letter>` sequence from `text`.
///
/// The matcher is conservative: a CSI introducer is consumed up to and
/// including the first ASCII letter; a bare ESC not followed by `[` is kept.
/// Stripping is idempotent.
pub fn strip(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Renders escape bytes visibly, turning each ESC into the literal `\x1b`.
///
/// Useful when inspecting colorized output in tests and diagnostics.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\x1b' {
            // SAFETY: write to a string always succeeds
            write!(&mut out, "\\x1b").unwrap();
        } else {
            out.push(ch);
        }
    }
    out
}
