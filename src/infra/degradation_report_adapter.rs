use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use crate::app::ports::DegradationReportPort;
use crate::error::Result;
use crate::pipeline::FileReport;

enum Target {
    File(PathBuf),
    /// `<dir>/<region>-degradation.txt`
    Folder(PathBuf),
}

/// File-based implementation of DegradationReportPort
/// Writes one `<file>: <summary>` line per input file
pub struct FileDegradationReportAdapter {
    target: Target,
}

impl FileDegradationReportAdapter {
    /// Report written to exactly `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
        }
    }

    /// Report named after the region, inside `dir`
    pub fn in_folder(dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Folder(dir.into()),
        }
    }

    fn path_for(&self, region: &str) -> PathBuf {
        match &self.target {
            Target::File(path) => path.clone(),
            Target::Folder(dir) => dir.join(format!("{}-degradation.txt", region)),
        }
    }
}

impl DegradationReportPort for FileDegradationReportAdapter {
    fn write_report(&self, region: &str, reports: &[FileReport]) -> Result<()> {
        let path = self.path_for(region);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!("Writing degradation report: {}", path.display());

        let mut writer = BufWriter::new(File::create(&path)?);
        for report in reports {
            writeln!(writer, "{}: {}", report.file, report.degradation.summary())?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::degrade::DegradationStats;
    use tempfile::TempDir;

    #[test]
    fn test_report_lines_per_file() {
        let dir = TempDir::new().unwrap();
        let adapter = FileDegradationReportAdapter::in_folder(dir.path());
        let reports = vec![FileReport {
            file: "camden.xml".to_string(),
            degradation: DegradationStats { found: 4, degraded: 3, removed: 0 },
        }];
        adapter.write_report("Camden", &reports).unwrap();

        let text = fs::read_to_string(dir.path().join("Camden-degradation.txt")).unwrap();
        assert_eq!(
            text,
            "camden.xml: 4 PersonBirthDate events were found, of which 3 were degraded to year of birth and school year\n"
        );
    }
}
