use crate::domain::model::{FileTreeEntry, ProjectTree};
use crate::utils::error::{CodegenError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const WORKSPACE_PREFIX: &str = "codegen-project-";

/// 單次執行專屬的暫存工作目錄，drop 時連同內容一併刪除
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// 在 `parent`（預設為系統暫存目錄）下建立唯一命名的目錄
    pub fn acquire(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| CodegenError::ArchiveWriteError {
            message: format!("cannot create workspace: {}", e),
        })?;

        tracing::debug!("Acquired workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.dir.path().to_path_buf(), |acc, segment| acc.join(segment))
    }

    /// 寫入失敗屬於封裝階段的錯誤
    pub fn write_tree(&self, tree: &ProjectTree) -> Result<()> {
        for entry in tree {
            let target = self.resolve(&entry.path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| write_failure(&entry.path, e))?;
            }
            std::fs::write(&target, &entry.content).map_err(|e| write_failure(&entry.path, e))?;
        }

        tracing::debug!(
            "Wrote {} files into workspace {}",
            tree.len(),
            self.path().display()
        );
        Ok(())
    }

    pub fn read_entry(&self, entry: &FileTreeEntry) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.resolve(&entry.path))
    }
}

fn write_failure(path: &str, err: std::io::Error) -> CodegenError {
    CodegenError::ArchiveWriteError {
        message: format!("cannot stage '{}' in workspace: {}", path, err),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        tracing::debug!("Releasing workspace {}", self.dir.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::acquire(Some(parent.path())).unwrap();
            assert!(workspace.path().exists());
            assert!(workspace
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(WORKSPACE_PREFIX));
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_workspaces_are_distinct() {
        let parent = TempDir::new().unwrap();
        let first = Workspace::acquire(Some(parent.path())).unwrap();
        let second = Workspace::acquire(Some(parent.path())).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_write_tree_creates_nested_directories() {
        let workspace = Workspace::acquire(None).unwrap();
        let mut tree = ProjectTree::new();
        tree.insert("src/main/java/com/acme/Item.java", "package com.acme;")
            .unwrap();
        tree.insert("pom.xml", "<project/>").unwrap();

        workspace.write_tree(&tree).unwrap();

        let item = workspace.path().join("src/main/java/com/acme/Item.java");
        assert_eq!(std::fs::read_to_string(item).unwrap(), "package com.acme;");

        let first = tree.iter().next().unwrap();
        assert_eq!(workspace.read_entry(first).unwrap(), b"package com.acme;".to_vec());
    }

    #[test]
    fn test_write_failure_is_archive_error() {
        let workspace = Workspace::acquire(None).unwrap();
        // 先佔用一個目錄名稱，再把它當成檔案寫入
        std::fs::create_dir_all(workspace.path().join("src/main/java/com")).unwrap();

        let mut tree = ProjectTree::new();
        tree.insert("src/main/java/com", "<project/>").unwrap();

        let err = workspace.write_tree(&tree).unwrap_err();
        assert!(matches!(err, CodegenError::ArchiveWriteError { ref message } if message.contains("src/main/java/com")));
    }
}
