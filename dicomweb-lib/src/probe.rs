//! End-to-end walk of the service: studies, the first study's series, that
//! series' instance metadata, then the first instance file itself.

use segview_core::dicom_json::{tags, DicomDataset};
use segview_core::types::DicomImage;
use serde::Serialize;

use crate::{ClientError, DicomWebClient};

#[derive(Clone, Debug, Serialize)]
pub struct ProbeStep {
    pub endpoint: &'static str,
    pub url: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProbeReport {
    pub steps: Vec<ProbeStep>,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.ok)
    }

    fn record<T>(&mut self, endpoint: &'static str, url: String, result: &Result<T, ClientError>, ok_detail: impl FnOnce(&T) -> String) {
        let (ok, detail) = match result {
            Ok(v) => (true, ok_detail(v)),
            Err(e) => (false, e.to_string()),
        };
        self.steps.push(ProbeStep { endpoint, url, ok, detail });
    }
}

fn first_string(datasets: &[DicomDataset], tag: &str) -> Option<String> {
    datasets.first().and_then(|ds| ds.string(tag)).map(str::to_string)
}

/// Stops at the first failing or empty step.
pub async fn probe(client: &DicomWebClient) -> ProbeReport {
    let mut report = ProbeReport::default();

    let url = client.studies_url();
    let studies = client.list_studies().await;
    report.record("studies", url, &studies, |v| format!("{} studies", v.len()));
    let Some(study_uid) = studies.ok().and_then(|s| first_string(&s, tags::STUDY_INSTANCE_UID)) else {
        return report;
    };

    let url = client.series_url(&study_uid);
    let series = client.list_series(&study_uid).await;
    report.record("series", url, &series, |v| format!("{} series in study {study_uid}", v.len()));
    let Some(series_uid) = series.ok().and_then(|s| first_string(&s, tags::SERIES_INSTANCE_UID)) else {
        return report;
    };

    let url = client.metadata_url(&study_uid, &series_uid);
    let metadata = client.series_metadata(&study_uid, &series_uid).await;
    report.record("metadata", url, &metadata, |v| format!("{} instances in series {series_uid}", v.len()));
    let Some(first) = metadata.ok().and_then(|m| m.into_iter().next()) else {
        return report;
    };
    let (Some(sop_uid), Some(locator)) = (first.string(tags::SOP_INSTANCE_UID), first.string(tags::RETRIEVE_URL)) else {
        report.steps.push(ProbeStep {
            endpoint: "instance",
            url: String::new(),
            ok: false,
            detail: "first instance lacks SOP instance UID or retrieve URL".into(),
        });
        return report;
    };

    let image = DicomImage::new(sop_uid, 1, locator);
    let file = client.fetch_bytes(&image.source_url).await;
    report.record("instance", image.source_url.clone(), &file, |b| format!("{} bytes", b.len()));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_does_not_pass() {
        assert!(!ProbeReport::default().passed());
    }

    #[test]
    fn test_failed_step_fails_report() {
        let mut report = ProbeReport::default();
        report.record("studies", "u".into(), &Ok::<_, ClientError>(vec![1, 2]), |v| format!("{}", v.len()));
        assert!(report.passed());
        assert_eq!(report.steps[0].detail, "2");

        let err: Result<(), ClientError> = Err(ClientError::Status { url: "v".into(), status: 500 });
        report.record("series", "v".into(), &err, |_| String::new());
        assert!(!report.passed());
        assert_eq!(report.steps[1].detail, "v returned HTTP 500");
    }
}
