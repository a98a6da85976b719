use std::path::PathBuf;
use tracing::info;

use crate::app::ports::TableOutputPort;
use crate::constants::{CHILD_ID_COLUMN, REGION_CODE_LEN};
use crate::error::Result;
use crate::pipeline::processing::flatten::RecordTable;

/// Upper-cased leading characters of a regional file name, used to keep
/// child ids unique once regions are merged
pub fn region_code(file_name: &str) -> String {
    file_name.chars().take(REGION_CODE_LEN).collect::<String>().to_uppercase()
}

/// Merge regional tables, prefixing each child id with its region code
pub fn concat_tables(tables: Vec<(String, RecordTable)>) -> RecordTable {
    let mut merged = RecordTable::new();
    for (file_name, mut table) in tables {
        let prefix = region_code(&file_name);
        for row in table.rows.iter_mut() {
            if let Some(id) = row.get_mut(CHILD_ID_COLUMN) {
                id.insert_str(0, &prefix);
            }
        }
        merged.append(table);
    }
    merged
}

/// Use case for building the master table from every regional flat file
pub struct ConcatUseCase {
    output: Box<dyn TableOutputPort>,
}

impl ConcatUseCase {
    pub fn new(output: Box<dyn TableOutputPort>) -> Self {
        Self { output }
    }

    pub fn execute(&self, files: &[PathBuf]) -> Result<RecordTable> {
        info!("Processing {} flatfiles", files.len());
        let mut tables = Vec::with_capacity(files.len());
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            tables.push((name, RecordTable::read_csv(path)?));
        }
        let merged = concat_tables(tables);
        self.output.write_table(&merged)?;
        info!("Done! {} rows merged", merged.len());
        Ok(merged)
    }
}
