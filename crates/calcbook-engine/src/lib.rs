//! `calcbook-engine` defines the boundary between the calcbook SDK and the
//! opaque compute module that actually stores and evaluates cells.
//!
//! The SDK consumes the engine exclusively through the [`CalcEngine`]
//! capability trait, so the client layer stays engine-agnostic and can be
//! tested against any implementation of the same capability set. The crate
//! ships one such implementation, [`MemoryEngine`], which is both the
//! default backend and the test double.

mod memory;
mod style;
mod value;

pub use memory::{
    FunctionRegistry, MemoryEngine, MemoryEngineFactory, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT,
};
pub use style::{
    Alignment, Color, ColorParseError, Fill, FillPattern, Font, HorizontalAlignment, Style,
    VerticalAlignment,
};
pub use value::CellValue;

use thiserror::Error;

/// Identifier for a worksheet, assigned at creation and never reused
/// within an engine instance.
pub type SheetId = u32;

/// Maximum number of rows a worksheet can address (Excel-compatible).
pub const MAX_ROWS: u32 = 1_048_576;
/// Maximum number of columns a worksheet can address (Excel-compatible).
pub const MAX_COLUMNS: u32 = 16_384;

/// Generic failure value surfaced by an engine operation.
///
/// The engine does not commit to a structured taxonomy; the SDK layer is
/// responsible for translating these into typed errors while preserving
/// the message verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Occupied bounds of a worksheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SheetDimensions {
    pub min_row: u32,
    pub max_row: u32,
    pub min_column: u32,
    pub max_column: u32,
}

/// Capability set the SDK consumes.
///
/// All operations are synchronous. Sheet-local operations address the
/// sheet by its current positional index (0-based tab position); `row` and
/// `column` are 1-based. The engine enforces its own limits and raises
/// [`EngineError`] on any invalid input.
pub trait CalcEngine {
    /// Worksheet names in tab order.
    fn worksheet_names(&self) -> Vec<String>;
    /// Worksheet ids in tab order, parallel to [`worksheet_names`].
    ///
    /// [`worksheet_names`]: CalcEngine::worksheet_names
    fn worksheet_ids(&self) -> Vec<SheetId>;

    /// Append a worksheet with the given name.
    fn add_sheet(&mut self, name: &str) -> Result<(), EngineError>;
    /// Append a worksheet with an automatically generated `SheetN` name.
    fn new_sheet(&mut self) -> Result<(), EngineError>;
    fn rename_sheet(&mut self, sheet_index: u32, new_name: &str) -> Result<(), EngineError>;
    fn delete_sheet(&mut self, sheet_index: u32) -> Result<(), EngineError>;

    fn cell_value(&self, sheet_index: u32, row: u32, column: u32)
        -> Result<CellValue, EngineError>;
    /// The cell's value rendered through its number format.
    fn formatted_cell_value(
        &self,
        sheet_index: u32,
        row: u32,
        column: u32,
    ) -> Result<String, EngineError>;
    fn update_cell_with_text(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: &str,
    ) -> Result<(), EngineError>;
    fn update_cell_with_number(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), EngineError>;
    fn update_cell_with_bool(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: bool,
    ) -> Result<(), EngineError>;

    fn cell_formula(
        &self,
        sheet_index: u32,
        row: u32,
        column: u32,
    ) -> Result<Option<String>, EngineError>;
    fn update_cell_with_formula(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        formula: &str,
    ) -> Result<(), EngineError>;

    /// Clear the cell's value and formula. Positional style persists;
    /// "clear contents" is distinct from "clear formatting".
    fn clear_cell(&mut self, sheet_index: u32, row: u32, column: u32) -> Result<(), EngineError>;

    fn column_width(&self, sheet_index: u32, column: u32) -> Result<f64, EngineError>;
    fn set_column_width(
        &mut self,
        sheet_index: u32,
        column: u32,
        width: f64,
    ) -> Result<(), EngineError>;
    fn row_height(&self, sheet_index: u32, row: u32) -> Result<f64, EngineError>;
    fn set_row_height(&mut self, sheet_index: u32, row: u32, height: f64)
        -> Result<(), EngineError>;
    fn dimensions(&self, sheet_index: u32) -> Result<SheetDimensions, EngineError>;

    fn cell_style(&self, sheet_index: u32, row: u32, column: u32) -> Result<Style, EngineError>;
    fn set_cell_style(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        style: &Style,
    ) -> Result<(), EngineError>;

    /// Re-evaluate all formula cells.
    fn evaluate(&mut self) -> Result<(), EngineError>;

    /// Serialize the whole engine state to the workbook JSON format.
    fn to_json(&self) -> Result<String, EngineError>;
}

/// Constructs engines for the SDK's workbook entry points.
pub trait EngineFactory: Send + Sync {
    fn new_engine(&self) -> Box<dyn CalcEngine>;
    fn engine_from_json(&self, json: &str) -> Result<Box<dyn CalcEngine>, EngineError>;
    /// Load from an opaque byte buffer (format internal to the engine).
    fn engine_from_memory(&self, data: &[u8]) -> Result<Box<dyn CalcEngine>, EngineError>;
}
