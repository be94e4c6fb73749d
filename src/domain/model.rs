use crate::utils::error::{CodegenError, Result};
use std::collections::HashSet;
use std::fmt;

/// 使用者提供的資料 schema；管線只解讀 `rootPackage`
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    value: serde_json::Value,
    root_package: String,
}

impl Schema {
    pub const ROOT_PACKAGE_FIELD: &'static str = "rootPackage";

    pub fn new(value: serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| CodegenError::InvalidSchema {
            message: "schema must be a JSON object".to_string(),
        })?;

        let root_package = object
            .get(Self::ROOT_PACKAGE_FIELD)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CodegenError::InvalidSchema {
                message: format!(
                    "schema must contain a non-empty string '{}'",
                    Self::ROOT_PACKAGE_FIELD
                ),
            })?
            .to_string();

        Ok(Self { value, root_package })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::new(value)
    }

    pub fn root_package(&self) -> &str {
        &self.root_package
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    /// 供 prompt 內插使用的文字形式
    pub fn to_prompt_input(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.value)?)
    }
}

/// Bundle 中每個 artifact 的種類，順序即為生成回應中的固定順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Model,
    Repository,
    Service,
    Controller,
    Application,
    BuildDescriptor,
    RuntimeProperties,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::Model,
        ArtifactKind::Repository,
        ArtifactKind::Service,
        ArtifactKind::Controller,
        ArtifactKind::Application,
        ArtifactKind::BuildDescriptor,
        ArtifactKind::RuntimeProperties,
    ];

    pub const SOURCES: [ArtifactKind; 5] = [
        ArtifactKind::Model,
        ArtifactKind::Repository,
        ArtifactKind::Service,
        ArtifactKind::Controller,
        ArtifactKind::Application,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Repository => "repository",
            ArtifactKind::Service => "service",
            ArtifactKind::Controller => "controller",
            ArtifactKind::Application => "application entry point",
            ArtifactKind::BuildDescriptor => "build descriptor",
            ArtifactKind::RuntimeProperties => "runtime properties",
        }
    }

    /// 原始碼 artifact 所在的分層子目錄；入口類別放在命名空間根目錄
    pub fn layer(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Model => Some("model"),
            ArtifactKind::Repository => Some("repository"),
            ArtifactKind::Service => Some("service"),
            ArtifactKind::Controller => Some("controller"),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 單次生成回應解析出的 7 個具名 artifact，建立後不再變動
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    model: String,
    repository: String,
    service: String,
    controller: String,
    application: String,
    build_descriptor: String,
    runtime_properties: String,
}

impl ArtifactBundle {
    pub const ARITY: usize = ArtifactKind::ALL.len();

    /// 依 `ArtifactKind::ALL` 的順序建立；任何欄位為空即視為不完整
    pub fn from_ordered(segments: [String; 7]) -> Result<Self> {
        let found = segments.iter().filter(|s| !s.trim().is_empty()).count();
        if found < Self::ARITY {
            return Err(CodegenError::IncompleteGeneration {
                expected: Self::ARITY,
                found,
            });
        }

        let [model, repository, service, controller, application, build_descriptor, runtime_properties] =
            segments;

        Ok(Self {
            model,
            repository,
            service,
            controller,
            application,
            build_descriptor,
            runtime_properties,
        })
    }

    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Model => &self.model,
            ArtifactKind::Repository => &self.repository,
            ArtifactKind::Service => &self.service,
            ArtifactKind::Controller => &self.controller,
            ArtifactKind::Application => &self.application,
            ArtifactKind::BuildDescriptor => &self.build_descriptor,
            ArtifactKind::RuntimeProperties => &self.runtime_properties,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &str)> + '_ {
        ArtifactKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// 專案樹中的一個檔案；路徑一律為以 `/` 分隔的相對路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeEntry {
    pub path: String,
    pub content: Vec<u8>,
}

/// 依插入順序排列、路徑唯一的檔案集合。
///
/// 檔案路徑不可同時是另一個檔案的上層目錄，否則專案無法解開到磁碟上。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree {
    entries: Vec<FileTreeEntry>,
    paths: HashSet<String>,
    directories: HashSet<String>,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Result<()> {
        let path = path.into();
        let parents = parent_directories(&path);
        let overlaps = self.paths.contains(&path)
            || self.directories.contains(&path)
            || parents.iter().any(|dir| self.paths.contains(dir));
        if overlaps {
            return Err(CodegenError::PathCollision { path });
        }

        self.directories.extend(parents);
        self.paths.insert(path.clone());
        self.entries.push(FileTreeEntry {
            path,
            content: content.into(),
        });
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&FileTreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileTreeEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.content.len()).sum()
    }
}

/// `a/b/c.txt` → `["a", "a/b"]`
fn parent_directories(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(i, _)| &path[..i])
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect()
}

impl<'a> IntoIterator for &'a ProjectTree {
    type Item = &'a FileTreeEntry;
    type IntoIter = std::slice::Iter<'a, FileTreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
