use crate::core::materializer::ProjectLayout;
use crate::core::parser::DEFAULT_SEPARATOR;
use crate::core::pipeline::{PipelineOptions, WorkspaceMode};
use crate::core::prompts::PromptSet;
use crate::utils::error::{CodegenError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ARCHIVE_NAME: &str = "generated-project.zip";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    pub generation: GenerationConfig,
    pub project: ProjectLayout,
    pub output: OutputConfig,
    pub workspace: WorkspaceConfig,
    pub prompts: PromptSet,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
    pub separator: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: 0.2,
            timeout_seconds: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            filename: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub enabled: bool,
    pub directory: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl CodegenConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CodegenError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CodegenError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 預設值加上環境變數覆蓋，伺服器模式使用
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("CODEGEN_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.generation.api_key = Some(api_key);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.generation.model = model;
        }
        if let Ok(endpoint) = std::env::var("CODEGEN_ENDPOINT") {
            self.generation.endpoint = endpoint;
        }
        if let Ok(directory) = std::env::var("CODEGEN_WORKSPACE_DIR") {
            self.workspace.directory = Some(directory);
        }
        if let Ok(bind_address) = std::env::var("CODEGEN_BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CodegenError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn workspace_mode(&self) -> WorkspaceMode {
        if self.workspace.enabled {
            WorkspaceMode::TempDir {
                parent: self.workspace.directory.as_ref().map(PathBuf::from),
            }
        } else {
            WorkspaceMode::InMemory
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            separator: self.generation.separator.clone(),
            layout: self.project.clone(),
            prompts: self.prompts.clone(),
            workspace: self.workspace_mode(),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("generation.endpoint", &self.generation.endpoint)?;
        validate_non_empty_string("generation.model", &self.generation.model)?;
        validate_range("generation.temperature", self.generation.temperature, 0.0, 2.0)?;
        if let Some(timeout) = self.generation.timeout_seconds {
            validate_positive_number("generation.timeout_seconds", timeout, 1)?;
        }

        validate_path("output.path", &self.output.path)?;
        validate_non_empty_string("output.filename", &self.output.filename)?;

        if let Some(directory) = &self.workspace.directory {
            validate_path("workspace.directory", directory)?;
        }

        validate_non_empty_string("server.bind_address", &self.server.bind_address)?;

        self.pipeline_options().validate()
    }
}

impl Validate for CodegenConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[generation]
endpoint = "https://llm.example.com/v1/chat/completions"
model = "gpt-test"
temperature = 0.1

[project]
source_root = "src/main/java"
include_readme = false

[output]
path = "./build"
"#;

        let config = CodegenConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.generation.model, "gpt-test");
        assert_eq!(config.generation.separator, DEFAULT_SEPARATOR);
        assert!(!config.project.include_readme);
        assert_eq!(config.project.extension, "java");
        assert_eq!(config.output.path, "./build");
        assert_eq!(config.output.filename, DEFAULT_ARCHIVE_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CodegenConfig::from_toml_str("").unwrap();
        assert_eq!(config.generation.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.prompts, PromptSet::default());
        assert_eq!(
            config.workspace_mode(),
            WorkspaceMode::TempDir { parent: None }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CODEGEN_TEST_API_KEY", "sk-test-123");

        let toml_content = r#"
[generation]
api_key = "${CODEGEN_TEST_API_KEY}"
model = "${CODEGEN_TEST_UNSET_MODEL}"
"#;

        let config = CodegenConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-test-123"));
        assert_eq!(config.generation.model, "${CODEGEN_TEST_UNSET_MODEL}");

        std::env::remove_var("CODEGEN_TEST_API_KEY");
    }

    #[test]
    fn test_config_validation() {
        let invalid_endpoint = CodegenConfig::from_toml_str(
            r#"
[generation]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(invalid_endpoint.validate().is_err());

        let invalid_temperature = CodegenConfig::from_toml_str(
            r#"
[generation]
temperature = 3.5
"#,
        )
        .unwrap();
        assert!(invalid_temperature.validate().is_err());

        let invalid_prompt = CodegenConfig::from_toml_str(
            r#"
[prompts]
brief = "no placeholder here"
"#,
        )
        .unwrap();
        assert!(invalid_prompt.validate().is_err());
    }

    #[test]
    fn test_workspace_can_be_disabled() {
        let config = CodegenConfig::from_toml_str(
            r#"
[workspace]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.workspace_mode(), WorkspaceMode::InMemory);
        assert_eq!(config.pipeline_options().workspace, WorkspaceMode::InMemory);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[generation]
separator = "@@NEXT@@"

[output]
filename = "shop.zip"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = CodegenConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.generation.separator, "@@NEXT@@");
        assert_eq!(config.output.filename, "shop.zip");
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let err = CodegenConfig::from_toml_str("[generation\nmodel = 1").unwrap_err();
        assert!(matches!(err, CodegenError::ConfigValidationError { ref field, .. } if field == "toml_parsing"));
    }
}
