use catalog_etl::utils::error::ErrorSeverity;
use catalog_etl::utils::{logger, validation::Validate};
use catalog_etl::{CatalogPipeline, CliConfig, ConversionEngine, LocalStorage};
use clap::Parser;

fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting catalog-etl");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let pipeline = CatalogPipeline::new(LocalStorage::default(), config.to_settings());
    let engine = ConversionEngine::new(pipeline);

    match engine.run() {
        Ok(summary) => {
            let output_path = summary.output_path.unwrap_or_default();
            println!("✅ Converted {} of {} products", summary.converted, summary.input_records);
            println!("No of products with wrong syntax: {}", summary.failed);
            if summary.skipped > 0 {
                println!("Empty renders skipped: {}", summary.skipped);
            }
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("❌ Conversion failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
