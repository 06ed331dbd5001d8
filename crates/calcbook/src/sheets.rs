use std::rc::Rc;

use calcbook_engine::{CalcEngine, SheetId};

use crate::error::{CalcError, Result};
use crate::sheet::Sheet;
use crate::workbook::WorkbookInner;

/// Lookup table mapping sheet ids to their current name and tab position.
///
/// Loaded from the engine and rebuilt eagerly after every structural
/// mutation; never consulted across one.
#[derive(Clone, Debug, Default)]
pub(crate) struct SheetDirectory {
    /// Sheet ids in tab order.
    ids: Vec<SheetId>,
    /// Sheet names in tab order, parallel to `ids`.
    names: Vec<String>,
}

impl SheetDirectory {
    pub(crate) fn load(engine: &dyn CalcEngine) -> Self {
        let ids = engine.worksheet_ids();
        let names = engine.worksheet_names();
        debug_assert_eq!(ids.len(), names.len());
        SheetDirectory { ids, names }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn index_of(&self, sheet_id: SheetId) -> Option<u32> {
        self.ids.iter().position(|&id| id == sheet_id).map(|i| i as u32)
    }

    pub(crate) fn name_of(&self, sheet_id: SheetId) -> Option<String> {
        self.index_of(sheet_id)
            .map(|index| self.names[index as usize].clone())
    }

    pub(crate) fn id_at(&self, index: u32) -> Option<SheetId> {
        self.ids.get(index as usize).copied()
    }

    pub(crate) fn id_by_name(&self, name: &str) -> Option<SheetId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.ids[i])
    }
}

/// The collection of all sheets in a workbook.
pub struct Sheets {
    inner: Rc<WorkbookInner>,
}

impl Sheets {
    pub(crate) fn new(inner: Rc<WorkbookInner>) -> Self {
        Sheets { inner }
    }

    /// Number of sheets in the workbook.
    pub fn len(&self) -> usize {
        self.inner.with_directory(SheetDirectory::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a sheet by its current tab position (0-based).
    pub fn get(&self, index: u32) -> Result<Sheet> {
        let sheet_id = self
            .inner
            .with_directory(|d| d.id_at(index))
            .ok_or(CalcError::SheetIndexOutOfBounds(index))?;
        Ok(Sheet::new(Rc::clone(&self.inner), sheet_id))
    }

    /// Get a sheet by its exact name.
    pub fn get_by_name(&self, name: &str) -> Result<Sheet> {
        let sheet_id = self
            .inner
            .with_directory(|d| d.id_by_name(name))
            .ok_or_else(|| CalcError::SheetNameNotFound(name.to_string()))?;
        Ok(Sheet::new(Rc::clone(&self.inner), sheet_id))
    }

    /// Append a new sheet with an automatically generated name.
    pub fn add(&self) -> Result<Sheet> {
        self.inner.write(|engine| engine.new_sheet())?;
        self.inner.refresh_directory();
        self.last()
    }

    /// Append a new sheet with the given name.
    pub fn add_with_name(&self, name: &str) -> Result<Sheet> {
        self.inner.write(|engine| engine.add_sheet(name))?;
        self.inner.refresh_directory();
        self.last()
    }

    fn last(&self) -> Result<Sheet> {
        let count = self.len() as u32;
        self.get(count.saturating_sub(1))
    }
}
