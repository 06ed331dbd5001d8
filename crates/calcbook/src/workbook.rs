use std::cell::RefCell;
use std::rc::Rc;

use calcbook_engine::{CalcEngine, EngineError, SheetId};

use crate::cell::Cell;
use crate::error::{CalcError, Result};
use crate::reference::parse_cell_reference;
use crate::sheets::{SheetDirectory, Sheets};

/// Shared state behind every handle derived from one workbook.
///
/// The engine is the single source of truth; handles never cache engine
/// state. The sheet directory is the one piece of derived state and is
/// rebuilt eagerly after every structural mutation.
pub(crate) struct WorkbookInner {
    engine: RefCell<Box<dyn CalcEngine>>,
    directory: RefCell<SheetDirectory>,
}

impl WorkbookInner {
    pub(crate) fn new(engine: Box<dyn CalcEngine>) -> Rc<Self> {
        let directory = SheetDirectory::load(engine.as_ref());
        Rc::new(WorkbookInner {
            engine: RefCell::new(engine),
            directory: RefCell::new(directory),
        })
    }

    /// Rebuild the sheet lookup table from the engine. Must be called after
    /// any sheet add/rename/delete.
    pub(crate) fn refresh_directory(&self) {
        let directory = SheetDirectory::load(self.engine.borrow().as_ref());
        *self.directory.borrow_mut() = directory;
    }

    pub(crate) fn with_directory<R>(&self, f: impl FnOnce(&SheetDirectory) -> R) -> R {
        f(&self.directory.borrow())
    }

    /// Resolve a sheet id to its current positional index, failing with the
    /// stable id-bearing error once the sheet has been deleted.
    pub(crate) fn sheet_index(&self, sheet_id: SheetId) -> Result<u32> {
        self.directory
            .borrow()
            .index_of(sheet_id)
            .ok_or(CalcError::SheetNotFound(sheet_id))
    }

    /// Run a read-only engine operation, translating its failure.
    pub(crate) fn read<R>(
        &self,
        f: impl FnOnce(&dyn CalcEngine) -> std::result::Result<R, EngineError>,
    ) -> Result<R> {
        Ok(f(self.engine.borrow().as_ref())?)
    }

    /// Run a structural engine mutation (no re-evaluation).
    pub(crate) fn write<R>(
        &self,
        f: impl FnOnce(&mut dyn CalcEngine) -> std::result::Result<R, EngineError>,
    ) -> Result<R> {
        Ok(f(self.engine.borrow_mut().as_mut())?)
    }

    /// Run a cell or style mutation and re-evaluate the workbook.
    pub(crate) fn mutate<R>(
        &self,
        f: impl FnOnce(&mut dyn CalcEngine) -> std::result::Result<R, EngineError>,
    ) -> Result<R> {
        let mut engine = self.engine.borrow_mut();
        let result = f(engine.as_mut())?;
        engine.evaluate()?;
        Ok(result)
    }
}

/// A workbook handle.
///
/// All access goes through the engine behind a narrow capability trait; the
/// workbook itself holds no cell state. Handles derived from the workbook
/// (sheets, cells, style views) share this state and are cheap to create.
pub struct Workbook {
    pub(crate) inner: Rc<WorkbookInner>,
}

impl Workbook {
    /// Build a workbook over an arbitrary engine implementation.
    ///
    /// Useful for tests driving the SDK with a fake engine; normal callers
    /// go through [`initialize`](crate::initialize).
    pub fn with_engine(engine: Box<dyn CalcEngine>) -> Self {
        Workbook {
            inner: WorkbookInner::new(engine),
        }
    }

    /// The workbook's sheet collection.
    pub fn sheets(&self) -> Sheets {
        Sheets::new(Rc::clone(&self.inner))
    }

    /// Get a cell by a sheet-qualified reference like `Sheet1!A1`.
    pub fn cell(&self, reference: &str) -> Result<Cell> {
        let parsed = parse_cell_reference(reference)?;
        let sheet_name = parsed.sheet_name.ok_or(CalcError::MissingSheetName)?;
        let sheet = self.sheets().get_by_name(&sheet_name)?;
        Ok(sheet.cell_at(parsed.row, parsed.column))
    }

    /// Serialize the workbook to the engine's JSON format.
    pub fn to_json(&self) -> Result<String> {
        self.inner.read(|engine| engine.to_json())
    }
}
