use anyhow::{bail, Result};
use dicomweb_lib::{probe::probe, DicomWebClient};

pub async fn run(client: &DicomWebClient, json: bool) -> Result<()> {
    log::info!("Testing DICOMweb endpoints at {}", client.base_url());
    let report = probe(client).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (i, step) in report.steps.iter().enumerate() {
            let mark = if step.ok { "ok" } else { "FAIL" };
            println!("{}. {:<9} {:<4} {}", i + 1, step.endpoint, mark, step.url);
            println!("   {}", step.detail);
        }
    }

    if !report.passed() {
        bail!("probe failed after {} step(s)", report.steps.len());
    }
    Ok(())
}
