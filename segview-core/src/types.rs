use serde::{Deserialize, Serialize};

/// Scheme prefix the image engine expects on WADO-URI image ids.
pub const WADO_URI_SCHEME: &str = "wadouri:";

/// One 2-D slice of a series, as located through the metadata service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DicomImage {
    /// SOP instance UID.
    pub image_id: String,
    /// Position within the series; images are ordered ascending by this.
    pub instance_number: i64,
    /// Plain retrieve URL, without any engine scheme.
    pub source_url: String,
    /// Id handed to the image engine (`wadouri:` + source URL).
    pub engine_image_id: String,
}

impl DicomImage {
    /// Builds an image from a retrieve locator that may or may not already
    /// carry the `wadouri:` scheme.
    pub fn new(image_id: impl Into<String>, instance_number: i64, locator: &str) -> Self {
        let source_url = locator.strip_prefix(WADO_URI_SCHEME).unwrap_or(locator).to_string();
        let engine_image_id = format!("{WADO_URI_SCHEME}{source_url}");
        Self {
            image_id: image_id.into(),
            instance_number,
            source_url,
            engine_image_id,
        }
    }
}

/// Anatomical plane shown by one cell of the 2×2 viewer grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewId {
    Axial,
    Coronal,
    Sagittal,
    Volume,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [ViewId::Axial, ViewId::Coronal, ViewId::Sagittal, ViewId::Volume];

    pub fn title(self) -> &'static str {
        match self {
            ViewId::Axial => "Axial",
            ViewId::Coronal => "Coronal",
            ViewId::Sagittal => "Sagittal",
            ViewId::Volume => "3D Volume",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ViewId::Axial => "axial",
            ViewId::Coronal => "coronal",
            ViewId::Sagittal => "sagittal",
            ViewId::Volume => "3d",
        }
    }

    /// The 3-D cell is a placeholder and never binds an engine surface.
    pub fn is_planar(self) -> bool {
        !matches!(self, ViewId::Volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_scheme_is_normalised() {
        let plain = DicomImage::new("1.2.3", 4, "http://host/dicom/a.dcm");
        let prefixed = DicomImage::new("1.2.3", 4, "wadouri:http://host/dicom/a.dcm");
        assert_eq!(plain, prefixed);
        assert_eq!(plain.source_url, "http://host/dicom/a.dcm");
        assert_eq!(plain.engine_image_id, "wadouri:http://host/dicom/a.dcm");
    }

    #[test]
    fn test_only_volume_is_not_planar() {
        let planar: Vec<_> = ViewId::ALL.iter().filter(|v| v.is_planar()).collect();
        assert_eq!(planar.len(), 3);
        assert_eq!(ViewId::Volume.title(), "3D Volume");
    }
}
