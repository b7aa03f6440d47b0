use anyhow::Result;
use clap::Args;
use dicomweb_lib::DicomWebClient;
use segview_core::dicom_json::SeriesSummary;

#[derive(Args)]
pub struct SeriesArgs {
    /// Study instance UID
    pub study: String,
}

pub async fn run(client: &DicomWebClient, args: &SeriesArgs, json: bool) -> Result<()> {
    let datasets = client.list_series(&args.study).await?;
    let series: Vec<SeriesSummary> = datasets.iter().filter_map(SeriesSummary::from_dataset).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!("Found {} series in {}", series.len(), args.study);
    for s in &series {
        let number = s.number.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:>4} {:<5} {}  {}",
            number,
            s.modality.as_deref().unwrap_or("-"),
            s.series_uid,
            s.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
