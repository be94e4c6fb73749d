use crate::config::toml_config::CodegenConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "schema-codegen")]
#[command(about = "Generate a runnable backend project archive from a JSON schema")]
pub struct CliConfig {
    /// Path to the JSON schema file
    #[arg(long)]
    pub schema: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory the archive is written to
    #[arg(long)]
    pub output_path: Option<String>,

    /// Archive file name
    #[arg(long)]
    pub filename: Option<String>,

    /// Chat completions endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name sent to the generation service
    #[arg(long)]
    pub model: Option<String>,

    /// Build the project in memory instead of a temporary workspace
    #[arg(long)]
    pub in_memory: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Show the rendered brief prompt and layout without calling the service
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 載入設定檔（若有），再套用環境變數與命令列覆蓋
    pub fn resolve(&self) -> Result<CodegenConfig> {
        let mut config = match &self.config {
            Some(path) => CodegenConfig::from_file(path)?,
            None => CodegenConfig::default(),
        };
        config.apply_env_overrides();

        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if let Some(filename) = &self.filename {
            config.output.filename = filename.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.generation.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.generation.model = model.clone();
        }
        if self.in_memory {
            config.workspace.enabled = false;
        }

        Ok(config)
    }
}
