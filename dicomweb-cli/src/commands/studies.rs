use anyhow::Result;
use dicomweb_lib::DicomWebClient;
use segview_core::series::list_studies;

pub async fn run(client: &DicomWebClient, json: bool) -> Result<()> {
    let studies = list_studies(client).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&studies)?);
        return Ok(());
    }

    println!("Found {} studies", studies.len());
    for s in &studies {
        println!(
            "{:<18} {:<5} {:<12} {}",
            s.acquired_label(),
            s.modality.as_deref().unwrap_or("-"),
            s.patient_id.as_deref().unwrap_or("-"),
            s.study_uid
        );
        if let Some(ref desc) = s.description {
            println!("    {}", desc);
        }
    }
    Ok(())
}
