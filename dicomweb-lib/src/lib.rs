//! HTTP client for the DICOMweb-style metadata service.
//!
//! Works natively (tokio) and in the browser (reqwest's fetch backend);
//! the viewer and the `dicomweb` CLI share it.

mod error;
pub mod probe;

use std::future::Future;

use segview_core::dicom_json::DicomDataset;
use segview_core::series::MetadataSource;
use segview_core::LoadError;
use serde::de::DeserializeOwned;

pub use error::ClientError;

#[derive(Clone, Debug)]
pub struct DicomWebClient {
    http: reqwest::Client,
    base_url: String,
}

impl DicomWebClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn studies_url(&self) -> String {
        format!("{}/studies", self.base_url)
    }

    pub fn series_url(&self, study_uid: &str) -> String {
        format!("{}/studies/{study_uid}/series", self.base_url)
    }

    pub fn metadata_url(&self, study_uid: &str, series_uid: &str) -> String {
        format!("{}/studies/{study_uid}/series/{series_uid}/metadata", self.base_url)
    }

    pub fn segmentation_url(&self, patient_id: &str) -> String {
        format!("{}/segmentation/{patient_id}/segmentation.dcm", self.base_url)
    }

    /// GET returning the body bytes, or `None` on 404.
    pub async fn fetch_optional(&self, url: &str) -> Result<Option<Vec<u8>>, ClientError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Http { url: url.to_string(), source })?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| ClientError::Http { url: url.to_string(), source })?;
        Ok(Some(bytes.to_vec()))
    }

    /// GET returning the body bytes; any non-success status is an error.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.fetch_optional(url)
            .await?
            .ok_or_else(|| ClientError::Status { url: url.to_string(), status: 404 })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        log::debug!("GET {url}");
        let body = self.fetch_bytes(url).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { url: url.to_string(), source })
    }

    pub async fn list_studies(&self) -> Result<Vec<DicomDataset>, ClientError> {
        self.get_json(&self.studies_url()).await
    }

    pub async fn list_series(&self, study_uid: &str) -> Result<Vec<DicomDataset>, ClientError> {
        self.get_json(&self.series_url(study_uid)).await
    }

    pub async fn series_metadata(&self, study_uid: &str, series_uid: &str) -> Result<Vec<DicomDataset>, ClientError> {
        self.get_json(&self.metadata_url(study_uid, series_uid)).await
    }

    pub async fn segmentation_payload(&self, patient_id: &str) -> Result<Option<Vec<u8>>, ClientError> {
        self.fetch_optional(&self.segmentation_url(patient_id)).await
    }
}

impl MetadataSource for DicomWebClient {
    fn studies(&self) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
        async move { Ok(self.list_studies().await?) }
    }

    fn series(&self, study_uid: &str) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
        let study_uid = study_uid.to_string();
        async move { Ok(self.list_series(&study_uid).await?) }
    }

    fn instances(
        &self,
        study_uid: &str,
        series_uid: &str,
    ) -> impl Future<Output = Result<Vec<DicomDataset>, LoadError>> {
        let (study_uid, series_uid) = (study_uid.to_string(), series_uid.to_string());
        async move { Ok(self.series_metadata(&study_uid, &series_uid).await?) }
    }

    fn segmentation(&self, patient_id: &str) -> impl Future<Output = Result<Option<Vec<u8>>, LoadError>> {
        let patient_id = patient_id.to_string();
        async move { Ok(self.segmentation_payload(&patient_id).await?) }
    }
}
