use core::fmt;
use std::rc::Rc;

use calcbook_engine::{SheetDimensions, SheetId};

use crate::cell::Cell;
use crate::error::{CalcError, Result};
use crate::reference::parse_cell_reference;
use crate::workbook::WorkbookInner;

/// Handle to a single worksheet.
///
/// The handle references the sheet by its immutable `sheet_id` and resolves
/// the (mutable) name and tab position through the workbook's lookup table
/// on every access, so it survives renames and moves. After the sheet is
/// deleted the handle stays a valid object but every operation fails with a
/// [`CalcError::SheetNotFound`] carrying the id; ids are never recycled.
#[derive(Clone)]
pub struct Sheet {
    inner: Rc<WorkbookInner>,
    sheet_id: SheetId,
}

impl fmt::Debug for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Sheet: sheetId={}>", self.sheet_id)
    }
}

impl Sheet {
    pub(crate) fn new(inner: Rc<WorkbookInner>, sheet_id: SheetId) -> Self {
        Sheet { inner, sheet_id }
    }

    pub(crate) fn inner(&self) -> &Rc<WorkbookInner> {
        &self.inner
    }

    /// Resolve the sheet's current positional index at call time.
    pub(crate) fn resolve_index(&self) -> Result<u32> {
        self.inner.sheet_index(self.sheet_id)
    }

    /// The immutable sheet identity.
    pub fn id(&self) -> SheetId {
        self.sheet_id
    }

    /// The sheet's current name.
    pub fn name(&self) -> Result<String> {
        self.inner
            .with_directory(|d| d.name_of(self.sheet_id))
            .ok_or(CalcError::SheetNotFound(self.sheet_id))
    }

    /// The sheet's current tab position (0-based, mutable over time).
    pub fn index(&self) -> Result<u32> {
        self.resolve_index()
    }

    /// Rename the sheet. Name validity (blank, length, forbidden
    /// characters, duplicates) is enforced by the engine.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let index = self.resolve_index()?;
        self.inner.write(|engine| engine.rename_sheet(index, name))?;
        self.inner.refresh_directory();
        Ok(())
    }

    /// Delete the sheet. This transition is terminal: the id stays invalid
    /// for the rest of the session.
    pub fn delete(&self) -> Result<()> {
        let index = self.resolve_index()?;
        self.inner.write(|engine| engine.delete_sheet(index))?;
        self.inner.refresh_directory();
        Ok(())
    }

    /// Get a cell by a sheet-local reference like `A1`.
    ///
    /// Sheet-qualified references are rejected here; use
    /// [`Workbook::cell`](crate::Workbook::cell) for those.
    pub fn cell(&self, reference: &str) -> Result<Cell> {
        let parsed = parse_cell_reference(reference)?;
        if parsed.sheet_name.is_some() {
            return Err(CalcError::UnexpectedSheetName);
        }
        Ok(self.cell_at(parsed.row, parsed.column))
    }

    /// Get a cell by 1-based coordinates.
    ///
    /// No validation happens here; positivity and bounds are enforced by
    /// the engine when the cell is first used.
    pub fn cell_at(&self, row: u32, column: u32) -> Cell {
        Cell::new(self.clone(), row, column)
    }

    pub fn column_width(&self, column: u32) -> Result<f64> {
        let index = self.resolve_index()?;
        self.inner.read(|engine| engine.column_width(index, column))
    }

    pub fn set_column_width(&self, column: u32, width: f64) -> Result<()> {
        let index = self.resolve_index()?;
        self.inner
            .write(|engine| engine.set_column_width(index, column, width))
    }

    pub fn row_height(&self, row: u32) -> Result<f64> {
        let index = self.resolve_index()?;
        self.inner.read(|engine| engine.row_height(index, row))
    }

    pub fn set_row_height(&self, row: u32, height: f64) -> Result<()> {
        let index = self.resolve_index()?;
        self.inner
            .write(|engine| engine.set_row_height(index, row, height))
    }

    /// Occupied bounds of the sheet.
    pub fn dimensions(&self) -> Result<SheetDimensions> {
        let index = self.resolve_index()?;
        self.inner.read(|engine| engine.dimensions(index))
    }
}
