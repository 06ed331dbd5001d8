//! Live style views and detached snapshots.
//!
//! Two distinct shapes with distinct copy semantics:
//! - [`CellStyle`] (and its group views) is *live*: every property access
//!   forwards to the engine's style record for the cell's position.
//! - [`Style`] is the detached snapshot: a plain value record captured by
//!   [`CellStyle::snapshot`] and independent of the cell thereafter.

use calcbook_engine::{
    CellValue, Color, FillPattern, HorizontalAlignment, Style, VerticalAlignment,
};
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{CalcError, Result};

fn parse_color(literal: &str) -> Result<Color> {
    Color::parse_hex(literal).map_err(|_| CalcError::InvalidColor(literal.to_string()))
}

/// True for strings that would not survive re-entry as typed user input
/// without a quote prefix: formula look-alikes, number literals and
/// boolean literals.
pub(crate) fn needs_quote_prefix(text: &str) -> bool {
    text.starts_with('=')
        || text.parse::<f64>().is_ok()
        || text.eq_ignore_ascii_case("true")
        || text.eq_ignore_ascii_case("false")
}

/// Deep-partial update applied atomically by [`CellStyle::bulk_update`].
///
/// Only leaves that are `Some` are merged; everything else is left
/// untouched. Colors are hex literals validated before anything is
/// committed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentUpdate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    /// Hex color literal (`#RRGGBB`, case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FillUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<FillPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
}

impl From<&Style> for StyleUpdate {
    /// Full update covering every leaf of a snapshot.
    fn from(style: &Style) -> Self {
        StyleUpdate {
            number_format: Some(style.number_format.clone()),
            font: Some(FontUpdate {
                bold: Some(style.font.bold),
                italics: Some(style.font.italics),
                underline: Some(style.font.underline),
                strikethrough: Some(style.font.strikethrough),
                color: Some(style.font.color.to_string()),
            }),
            fill: Some(FillUpdate {
                pattern_type: Some(style.fill.pattern_type),
                foreground_color: Some(style.fill.foreground_color.to_string()),
                background_color: Some(style.fill.background_color.to_string()),
            }),
            alignment: Some(AlignmentUpdate {
                horizontal: Some(style.alignment.horizontal),
                vertical: Some(style.alignment.vertical),
                wrap_text: Some(style.alignment.wrap_text),
            }),
        }
    }
}

/// Live style view bound to one cell's position.
///
/// Nothing is cached: every accessor reads the engine's record at call
/// time, every setter is a read-modify-write committed as one engine
/// operation.
#[derive(Clone)]
pub struct CellStyle {
    cell: Cell,
}

impl CellStyle {
    pub(crate) fn new(cell: Cell) -> Self {
        CellStyle { cell }
    }

    /// Read the engine's current record for this position.
    fn record(&self) -> Result<Style> {
        let index = self.cell.sheet().resolve_index()?;
        self.cell.sheet().inner().read(|engine| {
            engine.cell_style(index, self.cell.row(), self.cell.column())
        })
    }

    /// Commit a full record for this position.
    pub(crate) fn write_record(&self, style: &Style) -> Result<()> {
        let index = self.cell.sheet().resolve_index()?;
        self.cell.sheet().inner().mutate(|engine| {
            engine.set_cell_style(index, self.cell.row(), self.cell.column(), style)
        })
    }

    /// Detached, by-value snapshot of the whole record. Mutating the cell
    /// afterwards does not change the snapshot, and vice versa.
    pub fn snapshot(&self) -> Result<Style> {
        self.record()
    }

    /// Merge the supplied leaves into the live record as a single atomic
    /// engine operation: either every leaf is committed or none are.
    pub fn bulk_update(&self, update: &StyleUpdate) -> Result<()> {
        let mut record = self.record()?;

        if let Some(number_format) = &update.number_format {
            record.number_format = number_format.clone();
        }
        if let Some(font) = &update.font {
            if let Some(bold) = font.bold {
                record.font.bold = bold;
            }
            if let Some(italics) = font.italics {
                record.font.italics = italics;
            }
            if let Some(underline) = font.underline {
                record.font.underline = underline;
            }
            if let Some(strikethrough) = font.strikethrough {
                record.font.strikethrough = strikethrough;
            }
            if let Some(color) = &font.color {
                record.font.color = parse_color(color)?;
            }
        }
        if let Some(fill) = &update.fill {
            if let Some(pattern_type) = fill.pattern_type {
                // Color fields survive a pattern change, including to
                // `none`; consumers ignore them in that case.
                record.fill.pattern_type = pattern_type;
            }
            if let Some(foreground) = &fill.foreground_color {
                record.fill.foreground_color = parse_color(foreground)?;
            }
            if let Some(background) = &fill.background_color {
                record.fill.background_color = parse_color(background)?;
            }
        }
        if let Some(alignment) = &update.alignment {
            if let Some(horizontal) = alignment.horizontal {
                record.alignment.horizontal = horizontal;
            }
            if let Some(vertical) = alignment.vertical {
                record.alignment.vertical = vertical;
            }
            if let Some(wrap_text) = alignment.wrap_text {
                record.alignment.wrap_text = wrap_text;
            }
        }

        self.write_record(&record)
    }

    /// Number format string, stored and returned verbatim.
    pub fn number_format(&self) -> Result<String> {
        Ok(self.record()?.number_format)
    }

    pub fn set_number_format(&self, number_format: &str) -> Result<()> {
        let mut record = self.record()?;
        record.number_format = number_format.to_string();
        self.write_record(&record)
    }

    /// Whether the stored value would need a quote prefix if re-entered as
    /// user input. Derived from the value; never independently settable.
    pub fn has_quote_prefix(&self) -> Result<bool> {
        Ok(match self.cell.value()? {
            CellValue::String(s) => needs_quote_prefix(&s),
            _ => false,
        })
    }

    pub fn font(&self) -> FontView {
        FontView {
            style: self.clone(),
        }
    }

    pub fn fill(&self) -> FillView {
        FillView {
            style: self.clone(),
        }
    }

    pub fn alignment(&self) -> AlignmentView {
        AlignmentView {
            style: self.clone(),
        }
    }
}

/// Live view over the font group.
#[derive(Clone)]
pub struct FontView {
    style: CellStyle,
}

impl FontView {
    pub fn bold(&self) -> Result<bool> {
        Ok(self.style.record()?.font.bold)
    }

    pub fn set_bold(&self, bold: bool) -> Result<()> {
        let mut record = self.style.record()?;
        record.font.bold = bold;
        self.style.write_record(&record)
    }

    pub fn italics(&self) -> Result<bool> {
        Ok(self.style.record()?.font.italics)
    }

    pub fn set_italics(&self, italics: bool) -> Result<()> {
        let mut record = self.style.record()?;
        record.font.italics = italics;
        self.style.write_record(&record)
    }

    pub fn underline(&self) -> Result<bool> {
        Ok(self.style.record()?.font.underline)
    }

    pub fn set_underline(&self, underline: bool) -> Result<()> {
        let mut record = self.style.record()?;
        record.font.underline = underline;
        self.style.write_record(&record)
    }

    pub fn strikethrough(&self) -> Result<bool> {
        Ok(self.style.record()?.font.strikethrough)
    }

    pub fn set_strikethrough(&self, strikethrough: bool) -> Result<()> {
        let mut record = self.style.record()?;
        record.font.strikethrough = strikethrough;
        self.style.write_record(&record)
    }

    /// Font color in canonical `#RRGGBB` form.
    pub fn color(&self) -> Result<Color> {
        Ok(self.style.record()?.font.color)
    }

    /// Set the font color from a hex literal. A malformed literal raises
    /// [`CalcError::InvalidColor`] and leaves the stored color unchanged.
    pub fn set_color(&self, color: &str) -> Result<()> {
        let parsed = parse_color(color)?;
        let mut record = self.style.record()?;
        record.font.color = parsed;
        self.style.write_record(&record)
    }
}

/// Live view over the fill group.
#[derive(Clone)]
pub struct FillView {
    style: CellStyle,
}

impl FillView {
    pub fn pattern_type(&self) -> Result<FillPattern> {
        Ok(self.style.record()?.fill.pattern_type)
    }

    /// Setting the pattern to `none` does not clear the stored color
    /// fields; they stay readable and consumers ignore them.
    pub fn set_pattern_type(&self, pattern_type: FillPattern) -> Result<()> {
        let mut record = self.style.record()?;
        record.fill.pattern_type = pattern_type;
        self.style.write_record(&record)
    }

    pub fn foreground_color(&self) -> Result<Color> {
        Ok(self.style.record()?.fill.foreground_color)
    }

    pub fn set_foreground_color(&self, color: &str) -> Result<()> {
        let parsed = parse_color(color)?;
        let mut record = self.style.record()?;
        record.fill.foreground_color = parsed;
        self.style.write_record(&record)
    }

    pub fn background_color(&self) -> Result<Color> {
        Ok(self.style.record()?.fill.background_color)
    }

    pub fn set_background_color(&self, color: &str) -> Result<()> {
        let parsed = parse_color(color)?;
        let mut record = self.style.record()?;
        record.fill.background_color = parsed;
        self.style.write_record(&record)
    }
}

/// Live view over the alignment group.
#[derive(Clone)]
pub struct AlignmentView {
    style: CellStyle,
}

impl AlignmentView {
    pub fn horizontal(&self) -> Result<HorizontalAlignment> {
        Ok(self.style.record()?.alignment.horizontal)
    }

    pub fn set_horizontal(&self, horizontal: HorizontalAlignment) -> Result<()> {
        let mut record = self.style.record()?;
        record.alignment.horizontal = horizontal;
        self.style.write_record(&record)
    }

    pub fn vertical(&self) -> Result<VerticalAlignment> {
        Ok(self.style.record()?.alignment.vertical)
    }

    pub fn set_vertical(&self, vertical: VerticalAlignment) -> Result<()> {
        let mut record = self.style.record()?;
        record.alignment.vertical = vertical;
        self.style.write_record(&record)
    }

    pub fn wrap_text(&self) -> Result<bool> {
        Ok(self.style.record()?.alignment.wrap_text)
    }

    pub fn set_wrap_text(&self, wrap_text: bool) -> Result<()> {
        let mut record = self.style.record()?;
        record.alignment.wrap_text = wrap_text;
        self.style.write_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn style_update_accepts_sparse_json() {
        let update: StyleUpdate = serde_json::from_str(
            r##"{"font": {"bold": true, "color": "#ff0000"}, "alignment": {"wrap_text": true}}"##,
        )
        .unwrap();
        assert_eq!(
            update,
            StyleUpdate {
                number_format: None,
                font: Some(FontUpdate {
                    bold: Some(true),
                    color: Some("#ff0000".to_string()),
                    ..Default::default()
                }),
                fill: None,
                alignment: Some(AlignmentUpdate {
                    wrap_text: Some(true),
                    ..Default::default()
                }),
            }
        );
    }

    #[test]
    fn style_update_serializes_only_present_leaves() {
        let update = StyleUpdate {
            number_format: Some("0.00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"number_format":"0.00"}"#
        );
    }

    #[test]
    fn quote_prefix_predicate() {
        for needs in ["0", "1", "1.2", "=3", "=1 + 1", "true", "TRUE", "false"] {
            assert!(needs_quote_prefix(needs), "{needs:?} should need a prefix");
        }
        for plain in ["", "text", "hello world", "1 + 1", "A1", "truth"] {
            assert!(!needs_quote_prefix(plain), "{plain:?} should not need a prefix");
        }
    }
}
