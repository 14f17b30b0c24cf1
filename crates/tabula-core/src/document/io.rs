use super::Document;
use crate::error::{Result, TabulaError};
use crate::storage::{Snapshot, read_snapshot, write_snapshot};
use std::path::{Path, PathBuf};
use tabula_engine::engine::{CellRef, recalculate_all};

impl Document {
    /// Capture the grid as a snapshot.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::from_grid(&self.grid)
    }

    /// Replace the whole grid with the snapshot's cells and recalculate
    /// every formula. The incoming cells are not validated.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Vec<CellRef> {
        let cells = snapshot.into_cells(&self.config.date_format);
        self.grid.clear();
        for (cell_ref, cell) in cells {
            self.grid.insert(cell_ref, cell);
        }
        self.modified = true;
        let recomputed = recalculate_all(&self.evaluator);
        log::debug!(
            "imported {} cell(s), {} formula(s) evaluated",
            self.grid.len(),
            recomputed.len()
        );
        recomputed
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(TabulaError::NoFilePath);
        };
        write_snapshot(&path, &self.export_snapshot())?;
        self.modified = false;
        Ok(path)
    }

    /// Save to `path` and make it the current file path.
    pub fn save_file_as(&mut self, path: &Path) -> Result<()> {
        write_snapshot(path, &self.export_snapshot())?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Load from file. The grid is only replaced once the file has been
    /// read and parsed.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let snapshot = read_snapshot(path)?;
        self.import_snapshot(snapshot);
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }
}
