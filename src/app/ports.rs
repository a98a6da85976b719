use crate::domain::RecordTree;
use crate::error::Result;
use crate::pipeline::processing::flatten::RecordTable;
use crate::pipeline::{FileReport, PipelineResult};

/// Destination for a finished flat table
pub trait TableOutputPort {
    fn write_table(&self, table: &RecordTable) -> Result<()>;
}

/// Destination for the per-region degradation report
pub trait DegradationReportPort {
    fn write_report(&self, region: &str, reports: &[FileReport]) -> Result<()>;
}

/// Destination for degraded trees in degrade-only mode
pub trait TreeOutputPort {
    fn write_tree(&self, tree: &RecordTree) -> Result<()>;
}

pub trait SummaryOutputPort {
    fn write_summary(&self, result: &PipelineResult) -> Result<()>;
}
