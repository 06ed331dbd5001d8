use core::fmt;

use calcbook_engine::{CellValue, Style};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::dates::{date_to_serial, serial_to_date};
use crate::error::{CalcError, Result};
use crate::reference::column_to_letters;
use crate::sheet::Sheet;
use crate::style::CellStyle;

/// Value accepted by [`Cell::set_value`].
///
/// Date inputs are converted to day serials through the serial converter
/// before any engine call; an out-of-range date raises without mutating
/// the cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellInput {
    /// Clear the cell's content (value and formula).
    Empty,
    Number(f64),
    String(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl From<f64> for CellInput {
    fn from(value: f64) -> Self {
        CellInput::Number(value)
    }
}

impl From<i32> for CellInput {
    fn from(value: i32) -> Self {
        CellInput::Number(value.into())
    }
}

impl From<i64> for CellInput {
    fn from(value: i64) -> Self {
        CellInput::Number(value as f64)
    }
}

impl From<bool> for CellInput {
    fn from(value: bool) -> Self {
        CellInput::Boolean(value)
    }
}

impl From<&str> for CellInput {
    fn from(value: &str) -> Self {
        CellInput::String(value.to_string())
    }
}

impl From<String> for CellInput {
    fn from(value: String) -> Self {
        CellInput::String(value)
    }
}

impl From<DateTime<Utc>> for CellInput {
    fn from(value: DateTime<Utc>) -> Self {
        CellInput::DateTime(value)
    }
}

impl From<NaiveDate> for CellInput {
    fn from(value: NaiveDate) -> Self {
        CellInput::DateTime(value.and_time(NaiveTime::MIN).and_utc())
    }
}

/// Handle to a single cell.
///
/// Cheap to construct and never caches engine state: every property access
/// re-resolves the sheet and reads through the engine, so a handle kept
/// across sheet mutations stays truthful (and fails with
/// [`CalcError::SheetNotFound`] once its sheet is gone).
#[derive(Clone)]
pub struct Cell {
    sheet: Sheet,
    row: u32,
    column: u32,
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Cell: R{}C{}>", self.row, self.column)
    }
}

impl Cell {
    pub(crate) fn new(sheet: Sheet, row: u32, column: u32) -> Self {
        Cell { sheet, row, column }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// 1-based row.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 1-based column.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Sheet-qualified textual reference, e.g. `Sheet1!A1`.
    pub fn text_reference(&self) -> Result<String> {
        let name = self.sheet.name()?;
        Ok(format!(
            "{name}!{}{}",
            column_to_letters(self.column),
            self.row
        ))
    }

    /// The cell's raw stored value (post value-or-formula resolution).
    /// Empty cells yield [`CellValue::Empty`].
    pub fn value(&self) -> Result<CellValue> {
        let index = self.sheet.resolve_index()?;
        self.sheet
            .inner()
            .read(|engine| engine.cell_value(index, self.row, self.column))
    }

    /// Set the cell's value, clearing any formula.
    ///
    /// A string that looks like a formula (leading `=`) is stored verbatim
    /// as a string; formula parsing happens only through
    /// [`set_formula`](Cell::set_formula).
    pub fn set_value(&self, value: impl Into<CellInput>) -> Result<()> {
        let input = value.into();
        let index = self.sheet.resolve_index()?;
        let inner = self.sheet.inner();
        match input {
            CellInput::Empty => {
                inner.mutate(|engine| engine.clear_cell(index, self.row, self.column))
            }
            CellInput::Number(n) => inner
                .mutate(|engine| engine.update_cell_with_number(index, self.row, self.column, n)),
            CellInput::String(s) => inner
                .mutate(|engine| engine.update_cell_with_text(index, self.row, self.column, &s)),
            CellInput::Boolean(b) => inner
                .mutate(|engine| engine.update_cell_with_bool(index, self.row, self.column, b)),
            CellInput::DateTime(date) => {
                // Serial conversion happens before any engine call; an
                // out-of-range date must not partially mutate the cell.
                let serial = date_to_serial(date)?;
                inner.mutate(|engine| {
                    engine.update_cell_with_number(index, self.row, self.column, serial)
                })
            }
        }
    }

    /// The stored value rendered through the cell's number format, e.g.
    /// `0.1` under `0.00%` reads as `10.00%`. Empty cells render as the
    /// empty string.
    pub fn formatted_value(&self) -> Result<String> {
        let index = self.sheet.resolve_index()?;
        self.sheet
            .inner()
            .read(|engine| engine.formatted_cell_value(index, self.row, self.column))
    }

    fn typed_value<T>(
        &self,
        expected: &'static str,
        extract: impl FnOnce(&CellValue) -> Option<T>,
    ) -> Result<T> {
        let value = self.value()?;
        extract(&value).ok_or_else(|| CalcError::TypeMismatch {
            expected,
            value: value.to_string(),
        })
    }

    /// The stored value as a number, failing with a `TypeMismatch` for any
    /// other runtime type.
    pub fn number_value(&self) -> Result<f64> {
        self.typed_value("number", |v| match v {
            CellValue::Number(n) => Some(*n),
            _ => None,
        })
    }

    /// The stored value as a string.
    pub fn string_value(&self) -> Result<String> {
        self.typed_value("string", |v| match v {
            CellValue::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// The stored value as a boolean.
    pub fn boolean_value(&self) -> Result<bool> {
        self.typed_value("boolean", |v| match v {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        })
    }

    /// The stored number interpreted as a day serial.
    ///
    /// Inherits [`number_value`](Cell::number_value)'s type contract and
    /// the serial converter's rejection of negative serials.
    pub fn date_value(&self) -> Result<DateTime<Utc>> {
        serial_to_date(self.number_value()?)
    }

    /// The cell's formula, or `None` for a plain value (not an error).
    pub fn formula(&self) -> Result<Option<String>> {
        let index = self.sheet.resolve_index()?;
        self.sheet
            .inner()
            .read(|engine| engine.cell_formula(index, self.row, self.column))
    }

    /// Set a formula; the derived value is computed by the engine and its
    /// stored type is driven by evaluation.
    pub fn set_formula(&self, formula: &str) -> Result<()> {
        let index = self.sheet.resolve_index()?;
        self.sheet.inner().mutate(|engine| {
            engine.update_cell_with_formula(index, self.row, self.column, formula)
        })
    }

    /// Clear the cell's content (value and formula). Positional style
    /// persists; clearing contents is not clearing formatting.
    pub fn delete(&self) -> Result<()> {
        self.set_value(CellInput::Empty)
    }

    /// Live style view bound to this cell's position.
    pub fn style(&self) -> CellStyle {
        CellStyle::new(self.clone())
    }

    /// Copy another cell's style onto this cell **by value**: a full read
    /// followed by a bulk write. Later mutations of either cell's style do
    /// not affect the other.
    pub fn set_style(&self, style: &CellStyle) -> Result<()> {
        self.set_style_snapshot(&style.snapshot()?)
    }

    /// Apply a detached style snapshot to this cell.
    pub fn set_style_snapshot(&self, snapshot: &Style) -> Result<()> {
        self.style().write_record(snapshot)
    }
}
