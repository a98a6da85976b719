use std::path::PathBuf;
use tracing::info;

use crate::app::ports::{DegradationReportPort, TreeOutputPort};
use crate::error::Result;
use crate::pipeline::parser::parse_file;
use crate::pipeline::processing::degrade::Degrader;
use crate::pipeline::FileReport;

/// Use case for the standalone degrader: rewrite birthdates and save the
/// degraded returns without cleaning or flattening them
pub struct DegradeUseCase {
    tree_output: Box<dyn TreeOutputPort>,
    report_output: Box<dyn DegradationReportPort>,
}

impl DegradeUseCase {
    pub fn new(tree_output: Box<dyn TreeOutputPort>, report_output: Box<dyn DegradationReportPort>) -> Self {
        Self {
            tree_output,
            report_output,
        }
    }

    pub fn execute(&self, region: &str, files: &[PathBuf]) -> Result<Vec<FileReport>> {
        let mut reports = Vec::with_capacity(files.len());
        for (index, path) in files.iter().enumerate() {
            info!("File {} out of {}", index + 1, files.len());
            let mut tree = parse_file(path)?;
            let degradation = Degrader::degrade(&mut tree);
            self.tree_output.write_tree(&tree)?;
            reports.push(FileReport {
                file: tree.name,
                degradation,
            });
        }
        self.report_output.write_report(region, &reports)?;
        Ok(reports)
    }
}
