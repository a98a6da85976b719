use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::TableOutputPort;
use crate::error::Result;
use crate::pipeline::processing::flatten::RecordTable;

/// File-based implementation of TableOutputPort
/// Writes the table as a comma separated file with a header row
pub struct CsvTableOutputAdapter {
    path: PathBuf,
}

impl CsvTableOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableOutputPort for CsvTableOutputAdapter {
    fn write_table(&self, table: &RecordTable) -> Result<()> {
        info!("Writing {} rows to {}", table.len(), self.path.display());
        table.write_csv(&self.path)
    }
}
