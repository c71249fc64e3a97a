//! Border catalog.
//!
//! Maps a border style identifier to the eleven box-drawing glyphs the
//! table renderer needs.

use crate::error::{Result, TabulaError};
use std::fmt;
use std::str::FromStr;

/// The glyph set used to draw one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub corner_top_left: &'static str,
    pub corner_top_right: &'static str,
    pub corner_bottom_left: &'static str,
    pub corner_bottom_right: &'static str,
    pub vertical: &'static str,
    pub horizontal: &'static str,
    pub tee_left: &'static str,
    pub tee_right: &'static str,
    pub tee_top: &'static str,
    pub tee_bottom: &'static str,
    pub cross: &'static str,
}

/// Selectable border styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    #[default]
    Default,
    Simple,
    Rounded,
    Double,
    SimpleDouble,
}

impl BorderStyle {
    /// All styles, in identifier order (`1` through `5`).
    pub const ALL: [BorderStyle; 5] = [
        Self::Default,
        Self::Simple,
        Self::Rounded,
        Self::Double,
        Self::SimpleDouble,
    ];

    /// Returns the style name as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Simple => "simple",
            Self::Rounded => "rounded",
            Self::Double => "double",
            Self::SimpleDouble => "simple-double",
        }
    }

    /// Resolves the style to its glyph set.
    pub fn glyphs(&self) -> Glyphs {
        match self {
            Self::Default => Glyphs {
                corner_top_left: "┏",
                corner_top_right: "┓",
                corner_bottom_left: "┗",
                corner_bottom_right: "┛",
                vertical: "┃",
                horizontal: "━",
                tee_left: "┣",
                tee_right: "┫",
                tee_top: "┳",
                tee_bottom: "┻",
                cross: "╋",
            },
            Self::Simple => Glyphs {
                corner_top_left: "┌",
                corner_top_right: "┐",
                corner_bottom_left: "└",
                corner_bottom_right: "┘",
                vertical: "│",
                horizontal: "─",
                tee_left: "├",
                tee_right: "┤",
                tee_top: "┬",
                tee_bottom: "┴",
                cross: "┼",
            },
            Self::Rounded => Glyphs {
                corner_top_left: "╭",
                corner_top_right: "╮",
                corner_bottom_left: "╰",
                corner_bottom_right: "╯",
                vertical: "│",
                horizontal: "─",
                tee_left: "├",
                tee_right: "┤",
                tee_top: "┬",
                tee_bottom: "┴",
                cross: "┼",
            },
            Self::Double => Glyphs {
                corner_top_left: "╔",
                corner_top_right: "╗",
                corner_bottom_left: "╚",
                corner_bottom_right: "╝",
                vertical: "║",
                horizontal: "═",
                tee_left: "╠",
                tee_right: "╣",
                tee_top: "╦",
                tee_bottom: "╩",
                cross: "╬",
            },
            Self::SimpleDouble => Glyphs {
                corner_top_left: "╒",
                corner_top_right: "╕",
                corner_bottom_left: "╘",
                corner_bottom_right: "╛",
                vertical: "│",
                horizontal: "═",
                tee_left: "╞",
                tee_right: "╡",
                tee_top: "╤",
                tee_bottom: "╧",
                cross: "╪",
            },
        }
    }
}

impl FromStr for BorderStyle {
    type Err = TabulaError;

    /// Accepts the numeric identifiers `1`-`5` or the style names.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "default" => Ok(Self::Default),
            "2" | "simple" => Ok(Self::Simple),
            "3" | "rounded" => Ok(Self::Rounded),
            "4" | "double" => Ok(Self::Double),
            "5" | "simple-double" | "simple_double" => Ok(Self::SimpleDouble),
            other => Err(TabulaError::config(format!(
                "Border style '{other}' is not defined. Expected 1-5 or one of: default, simple, rounded, double, simple-double"
            ))),
        }
    }
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
