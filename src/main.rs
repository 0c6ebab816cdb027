use clap::Parser;
use round_datetime::core::ConfigProvider;
use round_datetime::utils::{logger, validation::Validate};
use round_datetime::{CliConfig, LocalStorage, RoundDatePipeline, RoundingEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting round-datetime");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    if config.rounding_spec().is_empty() {
        tracing::warn!("No unit override given; the new field will copy the source values");
    }

    let summary_json = config.summary_json;
    let pipeline = RoundDatePipeline::new(LocalStorage::default(), config);
    let engine = RoundingEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            if summary_json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("✅ Script completed successfully");
                println!(
                    "📁 Field '{}' written to: {}",
                    summary.new_field, summary.output_path
                );
                println!(
                    "📊 {} rounded, {} null, {} failed of {} rows",
                    summary.rounded_rows,
                    summary.null_rows,
                    summary.failed_rows,
                    summary.total_rows
                );
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Rounding failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
