use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Files directly inside `dir` with the given extension, sorted by name
pub fn find_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// A region is named after the folder its returns are kept in
pub fn region_name(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "region".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.xml", "a.XML", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let files = find_files(dir.path(), "xml").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.XML", "b.xml"]);
    }

    #[test]
    fn test_region_name_is_folder_name() {
        let dir = TempDir::new().unwrap();
        let region = dir.path().join("Camden");
        fs::create_dir(&region).unwrap();
        assert_eq!(region_name(&region), "Camden");
    }
}
