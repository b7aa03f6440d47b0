mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dicomweb_lib::DicomWebClient;
use segview_core::config::DEFAULT_METADATA_BASE_URL;

#[derive(Parser)]
#[command(name = "dicomweb", about = "Inspect the segview DICOMweb metadata service")]
#[command(version)]
struct Cli {
    /// Service root, e.g. http://localhost:9999
    #[arg(long, global = true, env = "DICOMWEB_BASE_URL", default_value = DEFAULT_METADATA_BASE_URL)]
    base_url: String,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List studies
    Studies,
    /// List the series of a study
    Series(commands::series::SeriesArgs),
    /// List a series' instances in display order
    Instances(commands::instances::InstancesArgs),
    /// Walk studies → series → metadata → first instance file
    Probe,
    /// Download the segmentation payload associated with a study
    Segmentation(commands::segmentation::SegmentationArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let client = DicomWebClient::new(&cli.base_url);
    log::debug!("using service at {}", client.base_url());

    match &cli.command {
        Commands::Studies => commands::studies::run(&client, cli.json).await,
        Commands::Series(args) => commands::series::run(&client, args, cli.json).await,
        Commands::Instances(args) => commands::instances::run(&client, args, cli.json).await,
        Commands::Probe => commands::probe::run(&client, cli.json).await,
        Commands::Segmentation(args) => commands::segmentation::run(&client, args).await,
    }
}
