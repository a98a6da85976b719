use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

use crate::app::ports::SummaryOutputPort;
use crate::error::Result;
use crate::pipeline::PipelineResult;

/// File-based implementation of SummaryOutputPort
/// Writes the run summary as pretty-printed JSON
pub struct JsonSummaryOutputAdapter {
    path: PathBuf,
}

impl JsonSummaryOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SummaryOutputPort for JsonSummaryOutputAdapter {
    fn write_summary(&self, result: &PipelineResult) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!("Writing run summary: {}", self.path.display());
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, result)?;
        Ok(())
    }
}
