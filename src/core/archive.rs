use crate::core::workspace::Workspace;
use crate::domain::model::{FileTreeEntry, ProjectTree};
use crate::utils::error::{CodegenError, Result};
use std::borrow::Cow;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

/// 依 ProjectTree 的插入順序輸出 ZIP，每個檔案一個項目。
///
/// 時間戳記與權限固定，因此相同的專案樹會得到逐位元組相同的封裝。
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveBuilder;

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self
    }

    fn file_options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644)
    }

    pub fn build(&self, tree: &ProjectTree) -> Result<Vec<u8>> {
        self.write_entries(tree, |entry| Ok(Cow::Borrowed(entry.content.as_slice())))
    }

    /// 內容從工作目錄讀回，順序仍以 ProjectTree 為準
    pub fn build_from_workspace(&self, tree: &ProjectTree, workspace: &Workspace) -> Result<Vec<u8>> {
        self.write_entries(tree, |entry| workspace.read_entry(entry).map(Cow::Owned))
    }

    fn write_entries<'t, F>(&self, tree: &'t ProjectTree, mut read: F) -> Result<Vec<u8>>
    where
        F: FnMut(&'t FileTreeEntry) -> std::io::Result<Cow<'t, [u8]>>,
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        for entry in tree {
            let name = entry_name(&entry.path)?;
            let content = read(entry).map_err(|e| io_failure(&name, e))?;

            zip.start_file(name.as_str(), Self::file_options())?;
            zip.write_all(&content).map_err(|e| io_failure(&name, e))?;
            tracing::debug!("Added to archive: {} ({} bytes)", name, content.len());
        }

        // 完成並取回底層 Vec<u8>
        let cursor = zip.finish()?;
        let bytes = cursor.into_inner();

        tracing::debug!("Archive built: {} entries, {} bytes", tree.len(), bytes.len());
        Ok(bytes)
    }
}

fn entry_name(path: &str) -> Result<String> {
    let name = path.replace('\\', "/");
    if name.is_empty() || name.ends_with('/') {
        return Err(CodegenError::ArchiveWriteError {
            message: format!("'{}' is not a regular file path", path),
        });
    }
    Ok(name)
}

fn io_failure(name: &str, err: std::io::Error) -> CodegenError {
    CodegenError::ArchiveWriteError {
        message: format!("{}: {}", name, err),
    }
}
