use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dicomweb_lib::DicomWebClient;
use segview_core::series::load_segmentation;

#[derive(Args)]
pub struct SegmentationArgs {
    /// Study instance UID
    pub study: String,

    /// Output file
    #[arg(short, long, default_value = "segmentation.dcm")]
    pub out: PathBuf,
}

pub async fn run(client: &DicomWebClient, args: &SegmentationArgs) -> Result<()> {
    let Some(payload) = load_segmentation(client, &args.study).await? else {
        println!("No segmentation for study {}", args.study);
        return Ok(());
    };

    tokio::fs::write(&args.out, &payload)
        .await
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("Wrote {} bytes to {}", payload.len(), args.out.display());
    Ok(())
}
