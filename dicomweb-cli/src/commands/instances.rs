use anyhow::{Context, Result};
use clap::Args;
use dicomweb_lib::DicomWebClient;
use segview_core::series::{images_from_instances, load_study_images};

#[derive(Args)]
pub struct InstancesArgs {
    /// Study instance UID
    pub study: String,

    /// Series instance UID (defaults to the study's first series, as the viewer does)
    #[arg(long)]
    pub series: Option<String>,
}

pub async fn run(client: &DicomWebClient, args: &InstancesArgs, json: bool) -> Result<()> {
    let images = match &args.series {
        Some(series) => {
            let metadata = client.series_metadata(&args.study, series).await?;
            images_from_instances(&metadata)
                .with_context(|| format!("reading instances of series {series}"))?
        }
        None => load_study_images(client, &args.study).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&images)?);
        return Ok(());
    }

    println!("{} instances, viewer opens at #{}", images.len(), images.len() / 2);
    for (i, img) in images.iter().enumerate() {
        println!("{:>4}  n={:<5} {}  {}", i, img.instance_number, img.image_id, img.source_url);
    }
    Ok(())
}
