use std::path::PathBuf;
use tracing::debug;

use crate::app::ports::TreeOutputPort;
use crate::domain::RecordTree;
use crate::error::Result;
use crate::pipeline::parser::write_file;

/// File-based implementation of TreeOutputPort
/// Writes each tree under its original file name inside one folder
pub struct XmlTreeOutputAdapter {
    dir: PathBuf,
}

impl XmlTreeOutputAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TreeOutputPort for XmlTreeOutputAdapter {
    fn write_tree(&self, tree: &RecordTree) -> Result<()> {
        let path = self.dir.join(&tree.name);
        debug!("Re-writing {}", path.display());
        write_file(tree, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::{parse_file, parse_str};
    use tempfile::TempDir;

    #[test]
    fn test_tree_is_written_under_its_name() {
        let dir = TempDir::new().unwrap();
        let adapter = XmlTreeOutputAdapter::new(dir.path().join("Camden"));
        let tree = parse_str("camden.xml", "<Children><Child><LAchildID>1</LAchildID></Child></Children>").unwrap();
        adapter.write_tree(&tree).unwrap();

        let back = parse_file(&dir.path().join("Camden").join("camden.xml")).unwrap();
        assert_eq!(back.root, tree.root);
    }
}
