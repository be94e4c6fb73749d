use clap::Parser;
use schema_codegen::utils::error::ErrorSeverity;
use schema_codegen::utils::{logger, validation::Validate};
use schema_codegen::{
    CliConfig, CodegenConfig, CodegenError, CodegenPipeline, LocalStorage, OpenAiClient, RunContext,
    Schema, Storage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting schema-codegen CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let schema = match tokio::fs::read_to_string(&cli.schema)
        .await
        .map_err(CodegenError::from)
        .and_then(|content| Schema::from_json_str(&content))
    {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("❌ Failed to load schema '{}': {}", cli.schema, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let client = OpenAiClient::from_config(&config.generation)?;
    let pipeline = CodegenPipeline::with_options(client, config.pipeline_options())?;

    if cli.dry_run {
        perform_dry_run(&config, &pipeline, &schema)?;
        return Ok(());
    }

    let mut context = RunContext::new();
    match pipeline.run(&schema, &mut context).await {
        Ok(archive) => {
            let storage = LocalStorage::new(config.output.path.clone());
            let output_path = storage.write_file(&config.output.filename, &archive).await?;

            tracing::info!("✅ Generation completed successfully!");
            tracing::info!("📁 Archive saved to: {}", output_path);
            println!("✅ Generation completed successfully!");
            println!("📁 Archive saved to: {} ({} bytes)", output_path, archive.len());
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2, // 可重試
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn perform_dry_run(
    config: &CodegenConfig,
    pipeline: &CodegenPipeline<OpenAiClient>,
    schema: &Schema,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Generation Service:");
    println!("  Endpoint: {}", config.generation.endpoint);
    println!("  Model: {}", config.generation.model);
    println!(
        "  API key: {}",
        if config.generation.api_key.is_some() { "set" } else { "not set" }
    );
    println!("  Separator: {}", config.generation.separator);

    let layout = pipeline.layout();
    println!();
    println!("🗂️ Project Layout:");
    println!("  Root package: {}", schema.root_package());
    println!("  Source root: {} (*.{})", layout.source_root, layout.extension);
    println!("  Build descriptor: {}", layout.build_descriptor);
    println!("  Properties: {}", layout.properties_file);
    if layout.include_readme {
        println!("  README: {}", layout.readme_file);
    }

    println!();
    println!("💾 Output: {}/{}", config.output.path, config.output.filename);

    let schema_input = schema.to_prompt_input()?;
    println!();
    println!("📝 Brief prompt:");
    println!("{}", pipeline.prompts().brief_request(&schema_input).render());

    println!();
    println!("✅ Dry run analysis complete. No generation request was sent.");
    Ok(())
}
