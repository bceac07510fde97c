use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use retail_etl::config::Config;
use retail_etl::extract::extract_csv;
use retail_etl::logging;
use retail_etl::pipeline::validate::SalesValidator;
use retail_etl::pipeline::run_pipeline;

#[derive(Parser)]
#[command(name = "retail-etl")]
#[command(about = "Batch data-quality and enrichment pipeline for retail sales data")]
#[command(version)]
struct Cli {
    /// Path to the TOML run configuration
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: extract, validate, transform, load
    Run,
    /// Extract the raw sales file and print the validation report only
    Validate,
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Run => {
            println!("🚀 Running retail ETL pipeline...");
            match run_pipeline(&config) {
                Ok(report) => {
                    println!("\n📊 Pipeline results:");
                    println!("   Raw sales rows:     {}", report.raw_sales_rows);
                    println!("   Raw product rows:   {}", report.raw_product_rows);
                    println!(
                        "   Validation checks:  {}/{} passed",
                        report.checks_passed, report.checks_total
                    );
                    println!(
                        "   Clean sales rows:   {} ({} duplicate(s) removed)",
                        report.clean_sales_rows, report.duplicates_removed
                    );
                    println!("   Unmatched sales:    {}", report.unmatched_sales);
                    println!(
                        "   Summaries:          {} categories, {} stores, {} days",
                        report.categories, report.stores, report.days
                    );
                    println!("\n✅ Pipeline completed successfully");
                    println!("   Database : {}", config.paths.database.display());
                    println!("   CSVs     : {}/", config.paths.processed_dir.display());
                }
                Err(e) => {
                    error!("pipeline failed: {e}");
                    println!("❌ Pipeline failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Validate => {
            println!("🔍 Validating raw sales data...");
            let raw_sales = extract_csv(&config.paths.sales_csv)?;
            let report = SalesValidator::with_config(config.validation.clone()).run(&raw_sales);

            println!("\n📋 Validation report ({} rows):", raw_sales.len());
            for (name, outcome) in report.iter() {
                let status = if outcome.passed { "PASS" } else { "FAIL" };
                println!("   [{status}] {name}: {}", outcome.message);
            }
            println!(
                "\n{} {}/{} checks passed",
                if report.all_passed() { "✅" } else { "⚠️ " },
                report.passed_count(),
                report.len()
            );
            if !report.all_passed() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
