use anyhow::Context;
use schema_codegen::utils::{logger, validation::Validate};
use schema_codegen::{CodegenConfig, CodegenPipeline, OpenAiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_server_logger();

    tracing::info!("Starting codegen server");

    // 伺服器配置一律來自環境變數（可用 CODEGEN_CONFIG 指定 TOML 檔）
    let config = CodegenConfig::from_env().context("failed to load server configuration")?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if config.generation.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; requests are sent without authorization");
    }

    let client = OpenAiClient::from_config(&config.generation)
        .context("failed to build completion client")?;
    let pipeline = CodegenPipeline::with_options(client, config.pipeline_options())?;

    schema_codegen::server::serve(&config, pipeline)
        .await
        .context("server terminated with an error")?;
    Ok(())
}
