use std::path::PathBuf;
use tracing::info;

use crate::app::ports::{DegradationReportPort, SummaryOutputPort, TableOutputPort};
use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineResult};

/// Use case for turning one region's XML returns into a flat event table
pub struct FlatFileUseCase {
    config: AppConfig,
    table_output: Box<dyn TableOutputPort>,
    report_output: Option<Box<dyn DegradationReportPort>>,
    summary_output: Option<Box<dyn SummaryOutputPort>>,
}

impl FlatFileUseCase {
    pub fn new(config: AppConfig, table_output: Box<dyn TableOutputPort>) -> Self {
        Self {
            config,
            table_output,
            report_output: None,
            summary_output: None,
        }
    }

    pub fn with_report(mut self, report_output: Box<dyn DegradationReportPort>) -> Self {
        self.report_output = Some(report_output);
        self
    }

    pub fn with_summary(mut self, summary_output: Box<dyn SummaryOutputPort>) -> Self {
        self.summary_output = Some(summary_output);
        self
    }

    /// Run the full pipeline over `files` belonging to `region`
    pub fn execute(&self, region: &str, files: &[PathBuf]) -> Result<PipelineResult> {
        info!("🚀 Found {} CIN files for {}", files.len(), region);
        let output = Pipeline::new(&self.config).run(files)?;

        self.table_output.write_table(&output.table)?;
        if let Some(report) = &self.report_output {
            report.write_report(region, &output.result.file_reports)?;
        }
        if let Some(summary) = &self.summary_output {
            summary.write_summary(&output.result)?;
        }

        info!("🎉 {} rows written for {}", output.result.rows, region);
        Ok(output.result)
    }
}
