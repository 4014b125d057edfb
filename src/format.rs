//! Screen geometry and the per-call layout format.

use serde::{Deserialize, Serialize};

use crate::font_registry::FaceStyle;

/// Screen position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    /// Sentinel x-coordinate for direct placement: use the format's screen-left bound.
    pub const USE_MARGIN: i32 = -1;

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim {
    pub width: i32,
    pub height: i32,
}

impl Dim {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Horizontal alignment of committed lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Case transform applied per character before rasterization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    /// Upper-case the first letter of each word.
    Capitalize,
}

/// Layout parameters supplied with every layout call.
///
/// Screen bounds are absolute pixel coordinates of the drawable rectangle;
/// margins are paragraph-relative insets inside it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Line height as a multiple of `font_size`.
    pub line_height_factor: f32,
    /// Registry index of the face to use.
    pub font_index: usize,
    /// Glyph size in pixels.
    pub font_size: u16,
    /// First-line indent in pixels.
    pub indent: i32,
    pub margin_left: i32,
    pub margin_right: i32,
    pub margin_top: i32,
    pub margin_bottom: i32,
    pub screen_left: i32,
    pub screen_right: i32,
    pub screen_top: i32,
    pub screen_bottom: i32,
    /// Strip whitespace surrounding each word.
    pub trim: bool,
    /// Preformatted text: spaces added through `add_char` keep their width.
    pub pre: bool,
    pub font_style: FaceStyle,
    pub align: Align,
    pub text_transform: TextTransform,
}

impl Format {
    /// Format covering a whole `width` x `height` panel with default text settings.
    pub fn for_screen(width: i32, height: i32) -> Self {
        Self {
            screen_right: width,
            screen_bottom: height,
            ..Self::default()
        }
    }

    /// Line advance in pixels: `font_size * line_height_factor`, at least 1.
    pub fn line_height_px(&self) -> i32 {
        let px = (f32::from(self.font_size) * self.line_height_factor).round() as i32;
        px.max(1)
    }
}

impl Default for Format {
    fn default() -> Self {
        Self {
            line_height_factor: 1.25,
            font_index: 0,
            font_size: 12,
            indent: 0,
            margin_left: 0,
            margin_right: 0,
            margin_top: 0,
            margin_bottom: 0,
            screen_left: 0,
            screen_right: 540,
            screen_top: 0,
            screen_bottom: 960,
            trim: false,
            pre: false,
            font_style: FaceStyle::Normal,
            align: Align::Left,
            text_transform: TextTransform::None,
        }
    }
}

impl TextTransform {
    /// Apply the transform to one character. `first` marks the first letter of a word.
    pub(crate) fn apply(self, ch: char, first: bool) -> char {
        match self {
            Self::None => ch,
            Self::Uppercase => single_upper(ch),
            Self::Lowercase => single_lower(ch),
            Self::Capitalize if first => single_upper(ch),
            Self::Capitalize => ch,
        }
    }
}

// Multi-character case mappings (e.g. 'ß' -> "SS") would change glyph counts;
// keep the original character in that case.
fn single_upper(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(mapped), None) => mapped,
        _ => ch,
    }
}

fn single_lower(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(mapped), None) => mapped,
        _ => ch,
    }
}
