use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;
use tabula_engine::engine::{Cell, CellRef, DataType, Evaluator, Grid, StyleUpdate, new_grid};

/// A tagged change to a cell's declared type or one style field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellUpdate {
    DataType(DataType),
    Style(StyleUpdate),
}

/// Cells captured by copy or cut, positioned relative to `origin`.
#[derive(Clone, Debug)]
pub struct Clipboard {
    /// Top-left corner of the copied range.
    pub origin: CellRef,
    /// (column offset, row offset, cell) for every captured cell.
    pub cells: Vec<(usize, usize, Cell)>,
}

/// UI-agnostic document state for the spreadsheet.
pub struct Document {
    /// The spreadsheet grid, shared with the evaluator's built-ins.
    pub grid: Grid,
    /// Formula evaluator bound to `grid`
    pub(crate) evaluator: Evaluator,
    pub config: Config,
    /// Contents of the last copy/cut
    pub clipboard: Option<Clipboard>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified
    pub modified: bool,
}

impl Document {
    /// Create an empty document with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn with_config(config: Config) -> Self {
        let grid = new_grid();
        let evaluator = Evaluator::with_limits(grid.clone(), config.max_operations);
        Document {
            grid,
            evaluator,
            config,
            clipboard: None,
            file_path: None,
            modified: false,
        }
    }

    /// Create a new document and load a file if provided.
    pub fn with_file(path: Option<PathBuf>, config: Config) -> Result<Self> {
        let mut doc = Self::with_config(config);
        if let Some(ref p) = path {
            if p.exists() {
                doc.load_file(p)?;
            } else {
                doc.file_path = Some(p.clone());
                doc.modified = false;
            }
        }
        Ok(doc)
    }

    /// The cell at `cell_ref`, or an empty cell if none is stored.
    pub fn cell(&self, cell_ref: &CellRef) -> Cell {
        self.grid
            .get(cell_ref)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// The computed display value at `cell_ref`.
    pub fn display(&self, cell_ref: &CellRef) -> String {
        self.grid
            .get(cell_ref)
            .map(|entry| entry.computed.clone())
            .unwrap_or_default()
    }

    /// Non-empty cells in row-major order.
    pub fn filled_cells(&self) -> Vec<(CellRef, String)> {
        let mut cells: Vec<(CellRef, String)> = self
            .grid
            .iter()
            .filter(|entry| !entry.value().is_blank())
            .map(|entry| (entry.key().clone(), entry.computed.clone()))
            .collect();
        cells.sort_by(|(a, _), (b, _)| a.row.cmp(&b.row).then(a.col.cmp(&b.col)));
        cells
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
