use anyhow::Context;
use catalog_etl::utils::validation::{validate_file_extensions, Validate};
use catalog_etl::utils::logger;
use catalog_etl::{CatalogPipeline, ConversionEngine, LocalStorage, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-convert")]
#[command(about = "Supplier catalog conversion driven by a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "convert-config.toml")]
    config: String,

    /// Override conversion.input_path
    #[arg(long)]
    input: Option<String>,

    /// Override conversion.template
    #[arg(long)]
    template: Option<String>,

    /// Override conversion.output_path
    #[arg(long)]
    output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Read and convert, report counts, write nothing
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    validate_file_extensions("config", &[args.config.as_str()], &["toml"])?;
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based conversion '{}'", config.name());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = args.input {
        tracing::info!("🔧 input_path overridden to: {}", input);
        config.conversion.input_path = input;
    }
    if let Some(template) = args.template {
        tracing::info!("🔧 template overridden to: {}", template);
        config.conversion.template = template;
    }
    if let Some(output) = args.output {
        tracing::info!("🔧 output_path overridden to: {}", output);
        config.conversion.output_path = output;
    }

    if let Err(e) = config.validate() {
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        return Err(e).context("Configuration validation failed");
    }

    let settings = config.to_settings();
    tracing::info!(
        "📋 {} -> {} via {} ({}, delimiter '{}')",
        settings.input_path,
        settings.output_path,
        settings.template,
        settings.input_encoding,
        settings.input_delimiter.escape_default()
    );

    let engine = ConversionEngine::new(CatalogPipeline::new(LocalStorage::default(), settings));

    let summary = if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no output will be written");
        engine.dry_run()?
    } else {
        engine.run()?
    };

    println!(
        "✅ {} input rows: {} converted, {} with wrong syntax, {} empty",
        summary.input_records, summary.converted, summary.failed, summary.skipped
    );
    if let Some(output_path) = summary.output_path {
        println!("📁 Output saved to: {}", output_path);
    }

    Ok(())
}
