use crate::core::extractor::SourceHeader;
use crate::domain::model::{ArtifactBundle, ArtifactKind, ProjectTree};
use crate::utils::error::{CodegenError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_relative_path, Validate};
use serde::{Deserialize, Serialize};

/// 產出專案的檔案配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    pub source_root: String,
    pub extension: String,
    pub build_descriptor: String,
    pub properties_file: String,
    pub include_readme: bool,
    pub readme_file: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            source_root: "src/main/java".to_string(),
            extension: "java".to_string(),
            build_descriptor: "pom.xml".to_string(),
            properties_file: "src/main/resources/application.properties".to_string(),
            include_readme: true,
            readme_file: "README.md".to_string(),
        }
    }
}

impl Validate for ProjectLayout {
    fn validate(&self) -> Result<()> {
        validate_relative_path("project.source_root", &self.source_root)?;
        validate_non_empty_string("project.extension", &self.extension)?;
        validate_relative_path("project.build_descriptor", &self.build_descriptor)?;
        validate_relative_path("project.properties_file", &self.properties_file)?;
        if self.include_readme {
            validate_relative_path("project.readme_file", &self.readme_file)?;
        }

        // 固定檔案不可落在原始碼目錄內，也不可是它的上層
        let source_root = normalize(&self.source_root);
        let mut fixed = vec![
            ("project.build_descriptor", &self.build_descriptor),
            ("project.properties_file", &self.properties_file),
        ];
        if self.include_readme {
            fixed.push(("project.readme_file", &self.readme_file));
        }
        for (field, path) in fixed {
            let path_norm = normalize(path);
            if overlaps(&path_norm, &source_root) {
                return Err(CodegenError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: path.clone(),
                    reason: format!("overlaps the source root '{}'", source_root),
                });
            }
        }
        Ok(())
    }
}

/// 兩個路徑相同，或其中一個是另一個的上層目錄
fn overlaps(a: &str, b: &str) -> bool {
    a == b || a.starts_with(&format!("{}/", b)) || b.starts_with(&format!("{}/", a))
}

/// 將 artifact bundle 配置成專案樹
#[derive(Debug, Clone, Default)]
pub struct ProjectMaterializer {
    layout: ProjectLayout,
}

impl ProjectMaterializer {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// `<source_root>/<namespace>/<layer>/<Type>.<ext>`；
    /// 若 artifact 自己的 package 已以該分層結尾，就不再重複附加
    pub fn source_path(&self, kind: ArtifactKind, header: &SourceHeader) -> String {
        let mut segments: Vec<String> = Vec::new();

        let root = normalize(&self.layout.source_root);
        if !root.is_empty() {
            segments.push(root);
        }
        segments.push(header.namespace_path());

        if let Some(layer) = kind.layer() {
            if header.namespace.rsplit('.').next() != Some(layer) {
                segments.push(layer.to_string());
            }
        }

        segments.push(format!("{}.{}", header.type_name, self.layout.extension));
        segments.join("/")
    }

    pub fn materialize(&self, bundle: &ArtifactBundle, root_namespace: &str) -> Result<ProjectTree> {
        let mut tree = ProjectTree::new();

        for kind in ArtifactKind::SOURCES {
            let text = bundle.get(kind);
            let header = SourceHeader::parse(text).map_err(|e| e.into_malformed(kind))?;

            if !within_namespace(&header.namespace, root_namespace) {
                // 以 artifact 自行宣告的 package 為準
                tracing::debug!(
                    "{} declares package '{}' outside root namespace '{}'",
                    kind,
                    header.namespace,
                    root_namespace
                );
            }

            let path = self.source_path(kind, &header);
            tracing::debug!("Placing {} '{}' at {}", kind, header.type_name, path);
            tree.insert(path, text)?;
        }

        tree.insert(
            normalize(&self.layout.build_descriptor),
            bundle.get(ArtifactKind::BuildDescriptor),
        )?;
        tree.insert(
            normalize(&self.layout.properties_file),
            bundle.get(ArtifactKind::RuntimeProperties),
        )?;

        if self.layout.include_readme {
            let readme = render_readme(root_namespace, &tree);
            tree.insert(normalize(&self.layout.readme_file), readme)?;
        }

        tracing::debug!(
            "Materialized {} files ({} bytes)",
            tree.len(),
            tree.total_bytes()
        );
        Ok(tree)
    }
}

/// 以整段比對：`com.acme.shop.model` 屬於 `com.acme.shop`，`com.acme.shopping` 不屬於
fn within_namespace(namespace: &str, root: &str) -> bool {
    namespace == root
        || namespace
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

fn render_readme(root_namespace: &str, tree: &ProjectTree) -> String {
    let mut readme = String::new();
    readme.push_str("# Generated Spring Boot Project\n\n");
    readme.push_str(&format!("Root package: `{}`\n\n", root_namespace));
    readme.push_str("## How to Run\n\n");
    readme.push_str("1. Fill in the connection settings in the properties file.\n");
    readme.push_str("2. Start the application with `mvn spring-boot:run`.\n");
    readme.push_str("3. The API listens on http://localhost:8080 by default.\n\n");
    readme.push_str("## Files\n\n");
    for path in tree.paths() {
        readme.push_str(&format!("- `{}`\n", path));
    }
    readme
}
