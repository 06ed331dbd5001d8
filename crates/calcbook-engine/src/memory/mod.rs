//! In-memory reference implementation of the [`CalcEngine`] capability set.
//!
//! This is the default backend behind the SDK's `initialize()` entry point
//! and the test double for the handle layer. It stores cells sparsely per
//! sheet and evaluates formulas with a deliberately small interpreter; the
//! evaluation semantics are not part of the SDK contract.

mod eval;
mod format;
mod functions;

pub use functions::FunctionRegistry;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    CalcEngine, CellValue, EngineError, EngineFactory, SheetDimensions, SheetId, Style,
    MAX_COLUMNS, MAX_ROWS,
};

/// Default column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;
/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 21.0;

/// Maximum worksheet name length (Excel-compatible).
const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '[', ']'];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct CellState {
    #[serde(default)]
    value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default)]
    style: Style,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SheetState {
    id: SheetId,
    name: String,
    #[serde(default, with = "cell_map")]
    cells: HashMap<(u32, u32), CellState>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    column_widths: HashMap<u32, f64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    row_heights: HashMap<u32, f64>,
}

impl SheetState {
    fn new(id: SheetId, name: impl Into<String>) -> Self {
        SheetState {
            id,
            name: name.into(),
            cells: HashMap::new(),
            column_widths: HashMap::new(),
            row_heights: HashMap::new(),
        }
    }

    fn cell(&self, row: u32, column: u32) -> Option<&CellState> {
        self.cells.get(&(row, column))
    }

    fn cell_mut(&mut self, row: u32, column: u32) -> &mut CellState {
        self.cells.entry((row, column)).or_default()
    }
}

/// JSON-friendly encoding for the sparse cell map (tuple keys are not
/// representable as JSON object keys).
mod cell_map {
    use super::CellState;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        row: u32,
        column: u32,
        #[serde(flatten)]
        cell: CellState,
    }

    pub fn serialize<S: Serializer>(
        cells: &HashMap<(u32, u32), CellState>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<Entry> = cells
            .iter()
            .map(|(&(row, column), cell)| Entry {
                row,
                column,
                cell: cell.clone(),
            })
            .collect();
        entries.sort_by_key(|e| (e.row, e.column));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(u32, u32), CellState>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| ((e.row, e.column), e.cell))
            .collect())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WorkbookState {
    sheets: Vec<SheetState>,
    next_sheet_id: SheetId,
}

impl WorkbookState {
    fn new() -> Self {
        WorkbookState {
            sheets: vec![SheetState::new(1, "Sheet1")],
            next_sheet_id: 2,
        }
    }
}

/// In-memory calculation engine.
pub struct MemoryEngine {
    registry: Arc<FunctionRegistry>,
    state: WorkbookState,
}

impl MemoryEngine {
    /// Create an engine with a single empty `Sheet1`.
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        MemoryEngine {
            registry,
            state: WorkbookState::new(),
        }
    }

    /// Restore an engine from its JSON serialization.
    pub fn from_json(registry: Arc<FunctionRegistry>, json: &str) -> Result<Self, EngineError> {
        let state: WorkbookState = serde_json::from_str(json)
            .map_err(|e| EngineError::new(format!("Could not parse workbook JSON: {e}")))?;
        Ok(MemoryEngine { registry, state })
    }

    fn sheet(&self, sheet_index: u32) -> Result<&SheetState, EngineError> {
        self.state
            .sheets
            .get(sheet_index as usize)
            .ok_or_else(|| EngineError::new(format!("Invalid sheet index: {sheet_index}")))
    }

    fn sheet_mut(&mut self, sheet_index: u32) -> Result<&mut SheetState, EngineError> {
        self.state
            .sheets
            .get_mut(sheet_index as usize)
            .ok_or_else(|| EngineError::new(format!("Invalid sheet index: {sheet_index}")))
    }

    fn check_coordinates(row: u32, column: u32) -> Result<(), EngineError> {
        if row == 0 || row > MAX_ROWS {
            return Err(EngineError::new(format!("Invalid row: {row}")));
        }
        if column == 0 || column > MAX_COLUMNS {
            return Err(EngineError::new(format!("Invalid column: {column}")));
        }
        Ok(())
    }

    fn validate_sheet_name(&self, name: &str) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::new("Sheet name cannot be blank."));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(EngineError::new(format!(
                "Sheet name \"{name}\" is longer than 31 characters."
            )));
        }
        if name.contains(FORBIDDEN_NAME_CHARS) {
            return Err(EngineError::new(format!(
                "Sheet name \"{name}\" contains a forbidden character."
            )));
        }
        if self
            .state
            .sheets
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return Err(EngineError::new(format!(
                "Sheet \"{name}\" already exists."
            )));
        }
        Ok(())
    }

    fn push_sheet(&mut self, name: String) {
        let id = self.state.next_sheet_id;
        self.state.next_sheet_id += 1;
        self.state.sheets.push(SheetState::new(id, name));
    }
}

impl CalcEngine for MemoryEngine {
    fn worksheet_names(&self) -> Vec<String> {
        self.state.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn worksheet_ids(&self) -> Vec<SheetId> {
        self.state.sheets.iter().map(|s| s.id).collect()
    }

    fn add_sheet(&mut self, name: &str) -> Result<(), EngineError> {
        self.validate_sheet_name(name)?;
        self.push_sheet(name.to_string());
        Ok(())
    }

    fn new_sheet(&mut self) -> Result<(), EngineError> {
        let mut n = self.state.sheets.len() + 1;
        let name = loop {
            let candidate = format!("Sheet{n}");
            if self.validate_sheet_name(&candidate).is_ok() {
                break candidate;
            }
            n += 1;
        };
        self.push_sheet(name);
        Ok(())
    }

    fn rename_sheet(&mut self, sheet_index: u32, new_name: &str) -> Result<(), EngineError> {
        self.sheet(sheet_index)?;
        let current = &self.state.sheets[sheet_index as usize].name;
        if !current.eq_ignore_ascii_case(new_name) {
            self.validate_sheet_name(new_name)?;
        }
        self.state.sheets[sheet_index as usize].name = new_name.to_string();
        Ok(())
    }

    fn delete_sheet(&mut self, sheet_index: u32) -> Result<(), EngineError> {
        self.sheet(sheet_index)?;
        self.state.sheets.remove(sheet_index as usize);
        Ok(())
    }

    fn cell_value(
        &self,
        sheet_index: u32,
        row: u32,
        column: u32,
    ) -> Result<CellValue, EngineError> {
        Self::check_coordinates(row, column)?;
        Ok(self
            .sheet(sheet_index)?
            .cell(row, column)
            .map(|c| c.value.clone())
            .unwrap_or_default())
    }

    fn formatted_cell_value(
        &self,
        sheet_index: u32,
        row: u32,
        column: u32,
    ) -> Result<String, EngineError> {
        Self::check_coordinates(row, column)?;
        Ok(self
            .sheet(sheet_index)?
            .cell(row, column)
            .map(|c| format::render(&c.value, &c.style.number_format))
            .unwrap_or_default())
    }

    fn update_cell_with_text(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: &str,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        let cell = self.sheet_mut(sheet_index)?.cell_mut(row, column);
        cell.value = CellValue::String(value.to_string());
        cell.formula = None;
        Ok(())
    }

    fn update_cell_with_number(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        let cell = self.sheet_mut(sheet_index)?.cell_mut(row, column);
        cell.value = CellValue::Number(value);
        cell.formula = None;
        Ok(())
    }

    fn update_cell_with_bool(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        value: bool,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        let cell = self.sheet_mut(sheet_index)?.cell_mut(row, column);
        cell.value = CellValue::Boolean(value);
        cell.formula = None;
        Ok(())
    }

    fn cell_formula(
        &self,
        sheet_index: u32,
        row: u32,
        column: u32,
    ) -> Result<Option<String>, EngineError> {
        Self::check_coordinates(row, column)?;
        Ok(self
            .sheet(sheet_index)?
            .cell(row, column)
            .and_then(|c| c.formula.clone()))
    }

    fn update_cell_with_formula(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        formula: &str,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        if !formula.starts_with('=') {
            return Err(EngineError::new(format!(
                "Formula must start with '=': {formula:?}"
            )));
        }
        let cell = self.sheet_mut(sheet_index)?.cell_mut(row, column);
        cell.formula = Some(formula.to_string());
        cell.value = CellValue::Empty;
        Ok(())
    }

    fn clear_cell(&mut self, sheet_index: u32, row: u32, column: u32) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        let sheet = self.sheet_mut(sheet_index)?;
        if let Some(cell) = sheet.cells.get_mut(&(row, column)) {
            cell.value = CellValue::Empty;
            cell.formula = None;
        }
        Ok(())
    }

    fn column_width(&self, sheet_index: u32, column: u32) -> Result<f64, EngineError> {
        Self::check_coordinates(1, column)?;
        Ok(self
            .sheet(sheet_index)?
            .column_widths
            .get(&column)
            .copied()
            .unwrap_or(DEFAULT_COLUMN_WIDTH))
    }

    fn set_column_width(
        &mut self,
        sheet_index: u32,
        column: u32,
        width: f64,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(1, column)?;
        if !width.is_finite() || width < 0.0 {
            return Err(EngineError::new(format!("Invalid column width: {width}")));
        }
        self.sheet_mut(sheet_index)?.column_widths.insert(column, width);
        Ok(())
    }

    fn row_height(&self, sheet_index: u32, row: u32) -> Result<f64, EngineError> {
        Self::check_coordinates(row, 1)?;
        Ok(self
            .sheet(sheet_index)?
            .row_heights
            .get(&row)
            .copied()
            .unwrap_or(DEFAULT_ROW_HEIGHT))
    }

    fn set_row_height(
        &mut self,
        sheet_index: u32,
        row: u32,
        height: f64,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, 1)?;
        if !height.is_finite() || height < 0.0 {
            return Err(EngineError::new(format!("Invalid row height: {height}")));
        }
        self.sheet_mut(sheet_index)?.row_heights.insert(row, height);
        Ok(())
    }

    fn dimensions(&self, sheet_index: u32) -> Result<SheetDimensions, EngineError> {
        let sheet = self.sheet(sheet_index)?;
        let occupied = sheet
            .cells
            .iter()
            .filter(|(_, c)| !c.value.is_empty() || c.formula.is_some());
        let mut dims: Option<SheetDimensions> = None;
        for (&(row, column), _) in occupied {
            let d = dims.get_or_insert(SheetDimensions {
                min_row: row,
                max_row: row,
                min_column: column,
                max_column: column,
            });
            d.min_row = d.min_row.min(row);
            d.max_row = d.max_row.max(row);
            d.min_column = d.min_column.min(column);
            d.max_column = d.max_column.max(column);
        }
        // An empty sheet reports the A1 cell, like an empty workbook does.
        Ok(dims.unwrap_or(SheetDimensions {
            min_row: 1,
            max_row: 1,
            min_column: 1,
            max_column: 1,
        }))
    }

    fn cell_style(&self, sheet_index: u32, row: u32, column: u32) -> Result<Style, EngineError> {
        Self::check_coordinates(row, column)?;
        Ok(self
            .sheet(sheet_index)?
            .cell(row, column)
            .map(|c| c.style.clone())
            .unwrap_or_default())
    }

    fn set_cell_style(
        &mut self,
        sheet_index: u32,
        row: u32,
        column: u32,
        style: &Style,
    ) -> Result<(), EngineError> {
        Self::check_coordinates(row, column)?;
        self.sheet_mut(sheet_index)?.cell_mut(row, column).style = style.clone();
        Ok(())
    }

    fn evaluate(&mut self) -> Result<(), EngineError> {
        for sheet_index in 0..self.state.sheets.len() {
            let results: Vec<((u32, u32), CellValue)> = {
                let sheet = &self.state.sheets[sheet_index];
                sheet
                    .cells
                    .iter()
                    .filter_map(|(&key, cell)| cell.formula.as_deref().map(|f| (key, f)))
                    .map(|(key, formula)| {
                        (key, eval::evaluate_formula(formula, sheet, &self.registry))
                    })
                    .collect()
            };
            let sheet = &mut self.state.sheets[sheet_index];
            for (key, value) in results {
                if let Some(cell) = sheet.cells.get_mut(&key) {
                    cell.value = value;
                }
            }
        }
        Ok(())
    }

    fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(&self.state)
            .map_err(|e| EngineError::new(format!("Could not serialize workbook to JSON: {e}")))
    }
}

/// Factory handing out [`MemoryEngine`] instances that share one function
/// registry built at module initialization.
pub struct MemoryEngineFactory {
    registry: Arc<FunctionRegistry>,
}

impl MemoryEngineFactory {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }
}

impl EngineFactory for MemoryEngineFactory {
    fn new_engine(&self) -> Box<dyn CalcEngine> {
        Box::new(MemoryEngine::new(Arc::clone(&self.registry)))
    }

    fn engine_from_json(&self, json: &str) -> Result<Box<dyn CalcEngine>, EngineError> {
        Ok(Box::new(MemoryEngine::from_json(
            Arc::clone(&self.registry),
            json,
        )?))
    }

    fn engine_from_memory(&self, data: &[u8]) -> Result<Box<dyn CalcEngine>, EngineError> {
        let json = std::str::from_utf8(data)
            .map_err(|_| EngineError::new("Workbook data is not valid UTF-8."))?;
        self.engine_from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> MemoryEngine {
        MemoryEngine::new(Arc::new(FunctionRegistry::standard()))
    }

    #[test]
    fn starts_with_sheet1() {
        let engine = engine();
        assert_eq!(engine.worksheet_names(), vec!["Sheet1".to_string()]);
        assert_eq!(engine.worksheet_ids(), vec![1]);
    }

    #[test]
    fn sheet_ids_are_never_recycled() {
        let mut engine = engine();
        engine.new_sheet().unwrap(); // Sheet2, id 2
        engine.delete_sheet(1).unwrap();
        engine.new_sheet().unwrap();
        assert_eq!(engine.worksheet_ids(), vec![1, 3]);
    }

    #[test]
    fn rejects_invalid_sheet_names() {
        let mut engine = engine();
        assert!(engine.add_sheet("").is_err());
        assert!(engine.add_sheet("bad[name]").is_err());
        assert!(engine.add_sheet(&"x".repeat(32)).is_err());
        assert!(engine.add_sheet("Sheet1").is_err());
        assert!(engine.add_sheet("sheet1").is_err());
    }

    #[test]
    fn formula_evaluation_reads_referenced_cells() {
        let mut engine = engine();
        engine.update_cell_with_number(0, 1, 1, 13.0).unwrap();
        engine.update_cell_with_formula(0, 2, 1, "=A1*3").unwrap();
        engine.evaluate().unwrap();
        assert_eq!(engine.cell_value(0, 2, 1).unwrap(), CellValue::Number(39.0));
    }

    #[test]
    fn formula_chains_resolve_through_intermediate_formulas() {
        let mut engine = engine();
        engine.update_cell_with_number(0, 1, 1, 2.0).unwrap();
        engine.update_cell_with_formula(0, 2, 1, "=A1+1").unwrap();
        engine.update_cell_with_formula(0, 3, 1, "=A2*10").unwrap();
        engine.evaluate().unwrap();
        assert_eq!(engine.cell_value(0, 3, 1).unwrap(), CellValue::Number(30.0));
    }

    #[test]
    fn clear_cell_keeps_style() {
        let mut engine = engine();
        engine.update_cell_with_number(0, 1, 1, 3.0).unwrap();
        let mut style = Style::new();
        style.font.bold = true;
        engine.set_cell_style(0, 1, 1, &style).unwrap();
        engine.clear_cell(0, 1, 1).unwrap();
        assert_eq!(engine.cell_value(0, 1, 1).unwrap(), CellValue::Empty);
        assert!(engine.cell_style(0, 1, 1).unwrap().font.bold);
    }

    #[test]
    fn formatted_value_follows_the_number_format() {
        let mut engine = engine();
        engine.update_cell_with_number(0, 1, 1, 0.1).unwrap();
        assert_eq!(engine.formatted_cell_value(0, 1, 1).unwrap(), "0.1");
        let mut style = Style::new();
        style.number_format = "0.00%".to_string();
        engine.set_cell_style(0, 1, 1, &style).unwrap();
        assert_eq!(engine.formatted_cell_value(0, 1, 1).unwrap(), "10.00%");
        assert_eq!(engine.formatted_cell_value(0, 2, 1).unwrap(), "");
    }

    #[test]
    fn json_round_trip() {
        let mut engine = engine();
        engine.update_cell_with_text(0, 1, 2, "hello").unwrap();
        engine.set_column_width(0, 2, 140.0).unwrap();
        let json = engine.to_json().unwrap();
        let restored =
            MemoryEngine::from_json(Arc::new(FunctionRegistry::standard()), &json).unwrap();
        assert_eq!(
            restored.cell_value(0, 1, 2).unwrap(),
            CellValue::String("hello".to_string())
        );
        assert_eq!(restored.column_width(0, 2).unwrap(), 140.0);
    }

    #[test]
    fn coordinates_are_one_based_and_bounded() {
        let engine = engine();
        assert!(engine.cell_value(0, 0, 1).is_err());
        assert!(engine.cell_value(0, 1, 0).is_err());
        assert!(engine.cell_value(0, MAX_ROWS + 1, 1).is_err());
        assert!(engine.cell_value(0, 1, MAX_COLUMNS + 1).is_err());
        assert!(engine.cell_value(7, 1, 1).is_err());
    }
}
