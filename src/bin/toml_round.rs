use anyhow::Context;
use clap::Parser;
use round_datetime::core::ConfigProvider;
use round_datetime::utils::{logger, validation::Validate};
use round_datetime::{LocalStorage, RoundDatePipeline, RoundingEngine, TomlConfig, Unit};

#[derive(Parser)]
#[command(name = "toml-round")]
#[command(about = "Round a date-time field using a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "round-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Load and validate the job, print the plan, and leave the table untouched
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("📁 Loading job from: {}", args.config);

    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load job file '{}'", args.config))?;

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!("✅ Job '{}' loaded and validated", config.job_name());
    display_job_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the table will not be modified");
        return Ok(());
    }

    let pipeline = RoundDatePipeline::new(LocalStorage::default(), config);
    let engine = RoundingEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            println!("✅ Job completed successfully");
            println!(
                "📁 Field '{}' written to: {}",
                summary.new_field, summary.output_path
            );
            println!(
                "📊 {} rounded, {} null, {} failed of {} rows",
                summary.rounded_rows, summary.null_rows, summary.failed_rows, summary.total_rows
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Job failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_job_summary(config: &TomlConfig) {
    let spec = config.rounding_spec();
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job_name());
    println!("  Table: {}", config.input_path());
    println!(
        "  Output: {}",
        config.output_path().unwrap_or("(rewrite input table)")
    );
    println!("  Field: {} -> {}", config.source_field(), config.new_field());
    match config.oid_field() {
        Some(oid) => println!("  Row key: {}", oid),
        None => println!("  Row key: row position"),
    }
    println!("  Rounding: {}", spec);
    if let Some(anchor) = spec.anchor() {
        let reset: Vec<&str> = Unit::ALL
            .into_iter()
            .filter(|unit| *unit > anchor && spec.get(*unit).is_none())
            .map(Unit::name)
            .collect();
        if !reset.is_empty() {
            println!("  Reset to minimum: {}", reset.join(", "));
        }
    }
    println!("  On row error: {:?}", config.on_row_error());
    println!();
}
