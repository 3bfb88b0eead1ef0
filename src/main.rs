use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use mhd_pipeline::config::Config;
use mhd_pipeline::logging;
use mhd_pipeline::pipeline::{distinct_cities, Pipeline, RunReport};
use mhd_pipeline::providers::{
    synthetic, CensusAcsProvider, DemographicProvider, SyntheticProvider,
};
use mhd_pipeline::storage;

#[derive(Parser)]
#[command(name = "mhd_pipeline")]
#[command(about = "Massachusetts housing data cleaning and census merge pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw listing file into the typed cleaned dataset
    Clean,
    /// Fetch or generate the town demographic dataset
    Demographics {
        /// Demographic source to use. Available: census, synthetic
        #[arg(long, default_value = "census")]
        provider: String,
        /// Seed for the synthetic provider
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Merge the cleaned listings with the demographic dataset
    Merge,
    /// Run the whole pipeline (clean, demographics, merge)
    Run {
        /// Demographic source to use. Available: census, synthetic
        #[arg(long, default_value = "census")]
        provider: String,
        /// Seed for the synthetic provider
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Build the requested provider. The synthetic provider draws its town list
/// from the cleaned dataset, so cleaning must have happened first.
fn build_provider(
    name: &str,
    seed: Option<u64>,
    config: &Config,
) -> Result<Box<dyn DemographicProvider>, Box<dyn std::error::Error>> {
    match name {
        "census" => Ok(Box::new(CensusAcsProvider::new(config.census.clone())?)),
        "synthetic" => {
            let cleaned = storage::read_cleaned_listings(&config.data.cleaned_path)?;
            let cities = distinct_cities(&cleaned);
            warn!("using synthetic demographics; run outputs are not comparable to census runs");
            Ok(Box::new(SyntheticProvider::new(
                cities,
                seed.unwrap_or(synthetic::DEFAULT_SEED),
            )))
        }
        other => Err(format!("unknown provider '{}', expected census or synthetic", other).into()),
    }
}

fn print_report(report: &RunReport) {
    println!("\n📊 Pipeline Results:");
    println!("   Raw rows: {}", report.raw_rows);
    println!(
        "   Duplicates removed: {}",
        report.validation.duplicates_removed
    );
    println!(
        "   Dropped for missing price/city: {}",
        report.validation.missing_critical
    );
    println!("   Out-of-range rows: {}", report.validation.out_of_range);
    println!("   Cleaned rows: {}", report.validation.surviving_rows);
    println!("   Demographic towns: {}", report.towns);
    println!(
        "   City match rate: {}/{} distinct cities",
        report.resolution.matched, report.resolution.distinct_cities
    );
    if !report.resolution.unmatched.is_empty() {
        let sample: Vec<&str> = report
            .resolution
            .unmatched
            .iter()
            .take(10)
            .map(String::as_str)
            .collect();
        println!("   Unmatched cities (sample): {}", sample.join(", "));
    }
    println!(
        "   Merged rows: {} ({:.1}% with demographics)",
        report.listing_merge.total_rows,
        report.listing_merge.match_rate()
    );
    println!("   Town aggregates: {}", report.aggregate_rows);
    println!(
        "   Elapsed: {}ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let pipeline = Pipeline::new(config.clone());

    match cli.command {
        Commands::Clean => {
            println!("🧹 Cleaning raw listings...");
            match pipeline.clean() {
                Ok((cleaned, summary)) => {
                    println!(
                        "✅ Cleaned {} of {} rows ({} duplicates, {} missing price/city, {} out of range)",
                        summary.surviving_rows,
                        summary.input_rows,
                        summary.duplicates_removed,
                        summary.missing_critical,
                        summary.out_of_range
                    );
                    println!("   Distinct cities: {}", distinct_cities(&cleaned).len());
                    if let (Some(min), Some(max)) = (
                        cleaned.iter().map(|l| l.price).reduce(f64::min),
                        cleaned.iter().map(|l| l.price).reduce(f64::max),
                    ) {
                        println!("   Price range: ${:.0} - ${:.0}", min, max);
                    }
                    println!("   Output file: {}", config.data.cleaned_path);
                }
                Err(e) => {
                    error!("Cleaning failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Demographics { provider, seed } => {
            println!("🏛️  Fetching town demographics...");
            let provider = build_provider(&provider, seed, &config)?;
            match pipeline.fetch_demographics(provider.as_ref()).await {
                Ok(towns) => {
                    println!(
                        "✅ {} towns from the {} provider",
                        towns.len(),
                        provider.provider_name()
                    );
                    println!("   Output file: {}", config.data.census_path);
                }
                Err(e) => {
                    error!("Demographics fetch failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Merge => {
            println!("🔗 Merging listings with demographics...");
            let cleaned = storage::read_cleaned_listings(&config.data.cleaned_path)?;
            let towns = storage::read_demographics(&config.data.census_path)?;
            match pipeline.merge(&cleaned, &towns) {
                Ok((merged, aggregates, resolution, summary)) => {
                    println!(
                        "✅ Merged {} rows, {:.1}% with demographics ({}/{} cities matched)",
                        merged.len(),
                        summary.match_rate(),
                        resolution.matched,
                        resolution.distinct_cities
                    );
                    println!("   Town aggregates: {}", aggregates.len());
                    println!("   Output file: {}", config.data.merged_path);
                }
                Err(e) => {
                    error!("Merge failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Run { provider, seed } => {
            println!("🚀 Running full pipeline (clean, demographics, merge)...");
            // The synthetic provider needs the cleaned city list, so clean
            // before building it.
            if provider == "synthetic" {
                pipeline.clean()?;
            }
            let provider = build_provider(&provider, seed, &config)?;
            match pipeline.run(provider.as_ref()).await {
                Ok(report) => {
                    info!("Pipeline finished");
                    print_report(&report);
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
