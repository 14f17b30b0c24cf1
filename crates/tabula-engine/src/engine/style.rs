//! Presentation attributes carried by each cell.
//!
//! Styles are pure data: changing them never triggers recalculation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: u32 = 14;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Visual style of a cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Alignment,
    /// CSS-style color string; empty means "inherit".
    pub background_color: String,
    pub text_color: String,
    pub font_size: u32,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            bold: false,
            italic: false,
            underline: false,
            align: Alignment::Left,
            background_color: String::new(),
            text_color: String::new(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// A single-field style change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleUpdate {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Align(Alignment),
    BackgroundColor(String),
    TextColor(String),
    FontSize(u32),
}

impl Style {
    pub fn apply(&mut self, update: StyleUpdate) {
        match update {
            StyleUpdate::Bold(v) => self.bold = v,
            StyleUpdate::Italic(v) => self.italic = v,
            StyleUpdate::Underline(v) => self.underline = v,
            StyleUpdate::Align(v) => self.align = v,
            StyleUpdate::BackgroundColor(v) => self.background_color = v,
            StyleUpdate::TextColor(v) => self.text_color = v,
            StyleUpdate::FontSize(v) => self.font_size = v,
        }
    }
}
