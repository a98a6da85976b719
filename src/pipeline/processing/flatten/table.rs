use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::constants::{CHILD_ID_COLUMN, DATE_COLUMN, TYPE_COLUMN};
use crate::error::Result;

/// One row; absent keys are nulls
pub type Row = HashMap<String, String>;

/// A flat table with an explicit column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add `column` at the end unless it is already known
    pub fn register(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }

    pub fn get<'a>(&'a self, row: usize, column: &str) -> Option<&'a str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Append every row of `other`, unioning columns by name
    pub fn append(&mut self, other: RecordTable) {
        for column in &other.columns {
            self.register(column);
        }
        self.rows.extend(other.rows);
    }

    fn null_count(&self, row: &Row) -> usize {
        self.columns.iter().filter(|c| !row.contains_key(c.as_str())).count()
    }

    /// Keep one row per (child id, date, type), preferring the row with the
    /// fewest nulls; earlier rows win ties. Survivors keep their original
    /// order. Returns the number of rows dropped.
    pub fn deduplicate(&mut self) -> usize {
        let mut order: Vec<(usize, usize)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (self.null_count(row), index))
            .collect();
        order.sort_by_key(|(nulls, _)| *nulls);

        let mut seen = HashSet::new();
        let mut survivors: Vec<usize> = Vec::with_capacity(order.len());
        for (_, index) in order {
            let row = &self.rows[index];
            let key = (
                row.get(CHILD_ID_COLUMN).cloned(),
                row.get(DATE_COLUMN).cloned(),
                row.get(TYPE_COLUMN).cloned(),
            );
            if seen.insert(key) {
                survivors.push(index);
            }
        }
        survivors.sort_unstable();

        let before = self.rows.len();
        let mut rows: Vec<Option<Row>> = std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        self.rows = survivors.into_iter().filter_map(|index| rows[index].take()).collect();
        before - self.rows.len()
    }

    /// Move `lead` to the front, in that order, keeping the rest as they are
    pub fn lead_columns(&mut self, lead: &[&str]) {
        let rest: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !lead.contains(&c.as_str()))
            .cloned()
            .collect();
        self.columns = lead.iter().map(|c| c.to_string()).chain(rest).collect();
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.write_to(File::create(path)?)
    }

    /// Header row then one record per row; nulls become empty cells
    pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(sink);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(
                self.columns
                    .iter()
                    .map(|c| row.get(c).map(String::as_str).unwrap_or("")),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        Self::read_from(File::open(path)?)
    }

    /// Inverse of [`write_to`](Self::write_to): empty cells read back as nulls
    pub fn read_from<R: Read>(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(source);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Row = columns
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.is_empty())
                .map(|(column, value)| (column.clone(), value.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }
}
