use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::RecordTree;
use crate::error::Result;
use crate::pipeline::processing::degrade::{DegradationStats, Degrader};
use crate::pipeline::processing::flatten::{self, FlatTable, RecordTable};
use crate::pipeline::processing::normalize::{CleaningStats, Cleaner};
use crate::pipeline::processing::parser::{CinXmlParser, RecordParser};

/// Degradation outcome for one input file, as written to the region report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub degradation: DegradationStats,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: usize,
    pub children: usize,
    pub rows_before_dedup: usize,
    pub rows: usize,
    pub degradation: DegradationStats,
    pub cleaning: CleaningStats,
    pub file_reports: Vec<FileReport>,
}

/// The flat table plus the run summary that produced it
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: RecordTable,
    pub result: PipelineResult,
}

/// A tree that has been through degrade and clean
#[derive(Debug, Clone)]
pub struct ProcessedTree {
    pub tree: RecordTree,
    pub degradation: DegradationStats,
    pub cleaning: CleaningStats,
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    parser: Box<dyn RecordParser + 'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self::with_parser(config, Box::new(CinXmlParser))
    }

    pub fn with_parser(config: &'a AppConfig, parser: Box<dyn RecordParser + 'a>) -> Self {
        Self { config, parser }
    }

    /// Degrade then clean one tree in place
    #[instrument(skip(self, tree), fields(file = %tree.name))]
    pub fn process_tree(&self, mut tree: RecordTree) -> Result<ProcessedTree> {
        let degradation = Degrader::degrade(&mut tree);
        let cleaning = Cleaner::new(&self.config.fields).clean(&mut tree)?;
        Ok(ProcessedTree {
            tree,
            degradation,
            cleaning,
        })
    }

    pub fn process_file(&self, path: &Path) -> Result<ProcessedTree> {
        info!("📄 Processing {}", path.display());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = fs::read(path)?;
        self.process_tree(self.parser.parse(&name, &bytes)?)
    }

    /// Run every file through degrade and clean, then flatten them into one table
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub fn run(&self, files: &[PathBuf]) -> Result<PipelineOutput> {
        let started_at = Utc::now();
        let mut processed = Vec::with_capacity(files.len());
        for path in files {
            processed.push(self.process_file(path)?);
        }
        self.flatten(processed, started_at)
    }

    /// Flatten already processed trees; `started_at` is carried into the summary
    pub fn flatten(&self, processed: Vec<ProcessedTree>, started_at: DateTime<Utc>) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let mut degradation = DegradationStats::default();
        let mut cleaning = CleaningStats::default();
        let mut file_reports = Vec::with_capacity(processed.len());
        let mut trees = Vec::with_capacity(processed.len());

        for item in processed {
            degradation.merge(&item.degradation);
            cleaning.merge(&item.cleaning);
            file_reports.push(FileReport {
                file: item.tree.name.clone(),
                degradation: item.degradation,
            });
            trees.push(item.tree);
        }

        let children: usize = trees
            .iter()
            .filter_map(|t| t.children())
            .map(|c| c.children.len())
            .sum();

        let flat = flatten::build_record_table(&trees, &self.config.flatten)?;
        info!(
            "✅ Flattened {} children into {} rows ({} duplicates dropped)",
            children,
            flat.table.len(),
            flat.duplicates_dropped()
        );
        let FlatTable {
            table,
            rows_before_dedup,
        } = flat;

        let result = PipelineResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            files: trees.len(),
            children,
            rows_before_dedup,
            rows: table.len(),
            degradation,
            cleaning,
            file_reports,
        };
        Ok(PipelineOutput { table, result })
    }
}
