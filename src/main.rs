use clap::{Parser, Subcommand};
use tracing::error;

use events_map_builder::config::Config;
use events_map_builder::error::BuildError;
use events_map_builder::extract::read_events;
use events_map_builder::geocode::NominatimClient;
use events_map_builder::logging;
use events_map_builder::pipeline::run_build;

#[derive(Parser)]
#[command(name = "events-map-builder")]
#[command(about = "Converts the events workbook into a geocoded JSON feed for the map")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full build: extract, geocode, write events.json
    Build {
        /// Workbook path (overrides EXCEL_PATH)
        #[arg(long)]
        excel: Option<String>,
        /// Output directory (overrides OUT_DIR)
        #[arg(long)]
        out_dir: Option<String>,
    },
    /// Extract records without geocoding and print them as JSON
    Extract {
        /// Workbook path (overrides EXCEL_PATH)
        #[arg(long)]
        excel: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command {
        Commands::Build { excel, out_dir } => {
            if let Some(excel) = excel {
                config.excel_path = excel;
            }
            if let Some(out_dir) = out_dir {
                config.out_dir = out_dir;
            }

            println!("🚀 Building events feed from {}...", config.excel_path);
            let geocoder = NominatimClient::new(&config.nominatim_url, &config.user_agent)?;

            match run_build(&config, &geocoder).await {
                Ok(result) => {
                    println!("\n📊 Build results:");
                    println!("   Events: {}", result.event_count);
                    println!("   Unique locations: {}", result.unique_locations);
                    println!("   Cache hits: {}", result.cache_hits);
                    println!("   Network calls: {}", result.network_calls);
                    println!("   Unresolved locations: {}", result.failed_locations);
                    println!("   Output file: {}", result.output_file);
                }
                Err(e) => {
                    error!("Build failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Extract { excel } => {
            if let Some(excel) = excel {
                config.excel_path = excel;
            }
            if !std::path::Path::new(&config.excel_path).exists() {
                return Err(BuildError::InputMissing(config.excel_path).into());
            }
            let events = read_events(&config.excel_path)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }
    Ok(())
}
