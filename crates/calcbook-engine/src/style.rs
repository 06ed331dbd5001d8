use core::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 3-channel RGB color.
///
/// Serialized as a `#RRGGBB` hex string (always upper-case) so values read
/// back from the engine are canonical regardless of the casing supplied on
/// write.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub rgb: u32,
}

impl Color {
    pub const fn new_rgb(rgb: u32) -> Self {
        Self { rgb }
    }

    pub const fn black() -> Self {
        Self { rgb: 0x000000 }
    }

    pub const fn white() -> Self {
        Self { rgb: 0xFFFFFF }
    }

    /// Parse a strict `#RRGGBB` hex literal, case-insensitive on input.
    ///
    /// Shorthand (`#fff`) and alpha channels are rejected.
    pub fn parse_hex(s: &str) -> Result<Self, ColorParseError> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let rgb = u32::from_str_radix(hex, 16).map_err(|_| ColorParseError(s.to_string()))?;
        Ok(Color { rgb })
    }

    fn to_hex(self) -> String {
        format!("#{:06X}", self.rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse_hex(s.trim()).map_err(|e| D::Error::custom(e.to_string()))
    }
}

/// Raised when a color literal is not a strict 6-digit `#RRGGBB` string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a valid 3-channel hex color: {0:?}")]
pub struct ColorParseError(pub String);

fn is_false(v: &bool) -> bool {
    !*v
}

/// Font formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Font {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italics: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default = "Color::black")]
    pub color: Color,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            bold: false,
            italics: false,
            underline: false,
            strikethrough: false,
            color: Color::black(),
        }
    }
}

/// Fill pattern kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPattern {
    None,
    Solid,
    Gray125,
}

impl Default for FillPattern {
    fn default() -> Self {
        FillPattern::None
    }
}

impl fmt::Display for FillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillPattern::None => "none",
            FillPattern::Solid => "solid",
            FillPattern::Gray125 => "gray125",
        };
        f.write_str(name)
    }
}

/// Fill (background) formatting.
///
/// Color fields stay stored and readable even when `pattern_type` is
/// [`FillPattern::None`]; consumers are expected to ignore them in that
/// case rather than the engine resetting them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fill {
    #[serde(default)]
    pub pattern_type: FillPattern,
    #[serde(default = "Color::white")]
    pub foreground_color: Color,
    #[serde(default = "Color::white")]
    pub background_color: Color,
}

impl Default for Fill {
    fn default() -> Self {
        Fill {
            pattern_type: FillPattern::None,
            foreground_color: Color::white(),
            background_color: Color::white(),
        }
    }
}

/// Horizontal cell alignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    CenterContinuous,
    Right,
    Fill,
    Justify,
    Distributed,
}

impl Default for HorizontalAlignment {
    fn default() -> Self {
        HorizontalAlignment::General
    }
}

/// Vertical cell alignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    Justify,
    Distributed,
}

impl Default for VerticalAlignment {
    fn default() -> Self {
        VerticalAlignment::Top
    }
}

/// Text alignment formatting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alignment {
    #[serde(default)]
    pub horizontal: HorizontalAlignment,
    #[serde(default)]
    pub vertical: VerticalAlignment,
    #[serde(default, skip_serializing_if = "is_false")]
    pub wrap_text: bool,
}

/// The engine-owned style record for one cell position.
///
/// Cloning one yields a detached snapshot; live access goes through the
/// engine's `cell_style`/`set_cell_style` operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Number format string, stored verbatim (`general` by default).
    #[serde(default = "default_number_format")]
    pub number_format: String,
    #[serde(default)]
    pub font: Font,
    #[serde(default)]
    pub fill: Fill,
    #[serde(default)]
    pub alignment: Alignment,
}

fn default_number_format() -> String {
    "general".to_string()
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl Style {
    pub fn new() -> Self {
        Style {
            number_format: default_number_format(),
            font: Font::default(),
            fill: Fill::default(),
            alignment: Alignment::default(),
        }
    }
}
