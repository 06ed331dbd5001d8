//! `calcbook` is the client-facing SDK over the calculation engine.
//!
//! The SDK is a thin, handle-based layer: [`Workbook`], [`Sheet`] and
//! [`Cell`] hold no cell state of their own and forward every access to
//! the engine behind the [`CalcEngine`] capability trait. On top of the
//! raw engine operations the SDK adds the client-facing contract:
//! reference parsing, day-serial date conversion, typed value getters,
//! live style views with atomic bulk updates, and a typed error taxonomy
//! with deterministic messages.
//!
//! Entry point is the memoized [`initialize`] gate:
//!
//! ```no_run
//! # async fn demo() -> calcbook::Result<()> {
//! let api = calcbook::initialize().await;
//! let workbook = api.new_workbook();
//! let sheet = workbook.sheets().get(0)?;
//! sheet.cell("A1")?.set_value(42.0)?;
//! # Ok(())
//! # }
//! ```

mod cell;
mod dates;
mod error;
mod reference;
mod sheet;
mod sheets;
mod style;
mod workbook;

pub use calcbook_engine::{
    Alignment, CalcEngine, CellValue, Color, EngineError, EngineFactory, Fill, FillPattern, Font,
    FunctionRegistry, HorizontalAlignment, MemoryEngine, MemoryEngineFactory, SheetDimensions,
    SheetId, Style, VerticalAlignment, MAX_COLUMNS, MAX_ROWS,
};
pub use cell::{Cell, CellInput};
pub use dates::{date_to_serial, format_iso, serial_epoch, serial_to_date};
pub use error::{CalcError, ErrorKind, Result};
pub use reference::{column_to_letters, letters_to_column, parse_cell_reference, ParsedReference};
pub use sheet::Sheet;
pub use sheets::Sheets;
pub use style::{
    AlignmentUpdate, AlignmentView, CellStyle, FillUpdate, FillView, FontUpdate, FontView,
    StyleUpdate,
};
pub use workbook::Workbook;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

/// Number of times the expensive load path has actually run. Exposed for
/// tests asserting the memoization contract.
static LOAD_COUNT: AtomicUsize = AtomicUsize::new(0);

static SHEETS_API: OnceCell<SheetsApi> = OnceCell::const_new();

/// The initialized SDK: workbook entry points over a shared engine
/// factory.
///
/// Obtained through [`initialize`]; the instance is process-wide and the
/// underlying function registry is built exactly once.
pub struct SheetsApi {
    factory: Arc<dyn EngineFactory>,
}

impl SheetsApi {
    fn load() -> Self {
        LOAD_COUNT.fetch_add(1, Ordering::SeqCst);
        let registry = Arc::new(FunctionRegistry::standard());
        SheetsApi {
            factory: Arc::new(MemoryEngineFactory::new(registry)),
        }
    }

    /// Create an empty workbook with a single `Sheet1`.
    pub fn new_workbook(&self) -> Workbook {
        Workbook::with_engine(self.factory.new_engine())
    }

    /// Load a workbook from its JSON serialization.
    pub fn load_workbook_from_json(&self, json: &str) -> Result<Workbook> {
        Ok(Workbook::with_engine(self.factory.engine_from_json(json)?))
    }

    /// Load a workbook from an opaque byte buffer.
    pub fn load_workbook_from_memory(&self, data: &[u8]) -> Result<Workbook> {
        Ok(Workbook::with_engine(self.factory.engine_from_memory(data)?))
    }

    #[cfg(test)]
    fn load_count() -> usize {
        LOAD_COUNT.load(Ordering::SeqCst)
    }
}

/// Initialize the SDK, running the expensive load path at most once per
/// process. Concurrent and repeated calls all resolve to the same
/// instance; callers need no coordination of their own.
pub async fn initialize() -> &'static SheetsApi {
    SHEETS_API.get_or_init(|| async { SheetsApi::load() }).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn initialize_loads_exactly_once() {
        let mut handles = Vec::new();
        for _ in 0..16 {
            handles.push(tokio::spawn(async {
                let api = initialize().await;
                let workbook = api.new_workbook();
                workbook.sheets().len()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(SheetsApi::load_count(), 1);
    }
}
