//! Locating a study's images and segmentation through the metadata service.

use std::future::Future;
use crate::dicom_json::{tags, DicomDataset, StudySummary};
use crate::error::LoadError;
use crate::types::DicomImage;

/// Read-only access to the metadata service. Implemented over HTTP by
/// `dicomweb-lib`; tests use in-memory fakes.
pub trait MetadataSource {
    /// `GET /studies`
    fn studies(&self) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>>;

    /// `GET /studies/{study}/series`
    fn series(&self, study_uid: &str) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>>;

    /// `GET /studies/{study}/series/{series}/metadata`
    fn instances(
        &self,
        study_uid: &str,
        series_uid: &str,
    ) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>>;

    /// `GET /segmentation/{patient}/segmentation.dcm`; `None` when the
    /// service has no segmentation for that patient.
    fn segmentation(&self, patient_id: &str) -> impl Future<Output = Result<Option<Vec<u8>>, LoadError>>;
}

/// Converts instance metadata into images sorted by instance number.
///
/// Instances without an instance number take their 1-based position in the
/// response. The sort is stable, so ties keep response order.
pub fn images_from_instances(instances: &[DicomDataset]) -> Result<Vec<DicomImage>, LoadError> {
    let mut images = instances
        .iter()
        .enumerate()
        .map(|(position, ds)| {
            let image_id = ds
                .string(tags::SOP_INSTANCE_UID)
                .ok_or(LoadError::MissingTag(tags::SOP_INSTANCE_UID))?;
            let locator = ds
                .string(tags::RETRIEVE_URL)
                .ok_or(LoadError::MissingTag(tags::RETRIEVE_URL))?;
            let number = ds.int(tags::INSTANCE_NUMBER).unwrap_or(position as i64 + 1);
            Ok(DicomImage::new(image_id, number, locator))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    images.sort_by_key(|img| img.instance_number);
    Ok(images)
}

/// Loads the first series of a study as an ordered image list.
///
/// An empty series is an error: callers treat it exactly like a network
/// failure.
pub async fn load_study_images<S: MetadataSource>(
    source: &S,
    study_uid: &str,
) -> Result<Vec<DicomImage>, LoadError> {
    let series = source.series(study_uid).await?;
    let first = series.first().ok_or_else(|| LoadError::NoSeries(study_uid.to_string()))?;
    let series_uid = first
        .string(tags::SERIES_INSTANCE_UID)
        .ok_or(LoadError::MissingTag(tags::SERIES_INSTANCE_UID))?
        .to_string();

    let instances = source.instances(study_uid, &series_uid).await?;
    let images = images_from_instances(&instances)?;
    if images.is_empty() {
        return Err(LoadError::EmptySeries(series_uid));
    }
    log::debug!("study {study_uid}: {} images in series {series_uid}", images.len());
    Ok(images)
}

/// Finds the segmentation payload associated with a study, going through
/// the study listing to resolve the patient id.
pub async fn load_segmentation<S: MetadataSource>(
    source: &S,
    study_uid: &str,
) -> Result<Option<Vec<u8>>, LoadError> {
    let studies = source.studies().await?;
    let patient_id = studies
        .iter()
        .find(|ds| ds.string(tags::STUDY_INSTANCE_UID) == Some(study_uid))
        .and_then(|ds| ds.string(tags::PATIENT_ID));
    let Some(patient_id) = patient_id else {
        log::debug!("no study listing entry for {study_uid}, skipping segmentation");
        return Ok(None);
    };
    source.segmentation(patient_id).await
}

/// Study listing rows; datasets without a study UID are skipped.
pub async fn list_studies<S: MetadataSource>(source: &S) -> Result<Vec<StudySummary>, LoadError> {
    let studies = source.studies().await?;
    Ok(studies.iter().filter_map(StudySummary::from_dataset).collect())
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::Cell;
    use std::future::ready;
    use serde_json::json;
    use super::*;

    pub fn instance(uid: &str, number: Option<i64>) -> DicomDataset {
        let mut ds = DicomDataset::default();
        ds.insert(tags::SOP_INSTANCE_UID, Some("UI"), json!(uid));
        ds.insert(
            tags::RETRIEVE_URL,
            Some("UR"),
            json!(format!("http://localhost:9999/dicom/s/dicom_series/{uid}.dcm")),
        );
        if let Some(n) = number {
            ds.insert(tags::INSTANCE_NUMBER, Some("IS"), json!(n));
        }
        ds
    }

    /// Serves one study with a single series.
    #[derive(Default)]
    pub struct FakeSource {
        pub study_uid: String,
        pub patient_id: String,
        pub instances: Vec<DicomDataset>,
        pub no_series: bool,
        pub fail_instances: bool,
        pub segmentation: Option<Vec<u8>>,
        pub calls: Cell<usize>,
    }

    impl MetadataSource for FakeSource {
        fn studies(&self) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
            self.calls.set(self.calls.get() + 1);
            let mut ds = DicomDataset::default();
            ds.insert(tags::STUDY_INSTANCE_UID, Some("UI"), json!(self.study_uid));
            ds.insert(tags::PATIENT_ID, Some("LO"), json!(self.patient_id));
            ready(Ok(vec![ds]))
        }

        fn series(&self, study_uid: &str) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
            self.calls.set(self.calls.get() + 1);
            let result = if self.no_series || study_uid != self.study_uid {
                Vec::new()
            } else {
                let mut ds = DicomDataset::default();
                ds.insert(tags::SERIES_INSTANCE_UID, Some("UI"), json!(format!("{study_uid}.1")));
                vec![ds]
            };
            ready(Ok(result))
        }

        fn instances(
            &self,
            _study_uid: &str,
            series_uid: &str,
        ) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
            self.calls.set(self.calls.get() + 1);
            let result = if self.fail_instances {
                Err(LoadError::Status {
                    url: format!("/series/{series_uid}/metadata"),
                    status: 404,
                })
            } else {
                Ok(self.instances.clone())
            };
            ready(result)
        }

        fn segmentation(&self, patient_id: &str) -> impl Future<Output = Result<Option<Vec<u8>>, LoadError>> {
            self.calls.set(self.calls.get() + 1);
            let payload = if patient_id == self.patient_id { self.segmentation.clone() } else { None };
            ready(Ok(payload))
        }
    }
}
