//! Segmentation overlays: a per-pixel class label map plus the blend
//! opacity, rasterised to RGBA with the per-class parameters the host
//! composes from the sidebar.
//!
//! Decoding DICOM SEG payloads into label maps is a separate subsystem that
//! does not exist yet; [`NoDecoder`] stands in for it and never produces an
//! overlay.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use super::colors::class_color_rgb;
use super::store::ClassState;

/// Blend opacity used when a decoder does not specify one.
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.6;

/// Per-class overlay parameters passed down to viewports.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassOverlay {
    pub visible: bool,
    /// `0.0..=1.0`
    pub opacity: f32,
}

impl From<ClassState> for ClassOverlay {
    fn from(state: ClassState) -> Self {
        Self {
            visible: state.visible,
            opacity: f32::from(state.opacity) / 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationOverlay {
    pub width: u32,
    pub height: u32,
    /// Row-major; 0 is background, `n` is the class at index `n - 1`.
    pub labels: Vec<u16>,
    pub visible: bool,
    /// Alpha applied when compositing over the image, `0.0..=1.0`.
    pub opacity: f32,
}

impl SegmentationOverlay {
    /// Returns `None` if `labels` does not cover `width × height`.
    pub fn new(width: u32, height: u32, labels: Vec<u16>) -> Option<Self> {
        if labels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            labels,
            visible: true,
            opacity: DEFAULT_OVERLAY_OPACITY,
        })
    }
}

/// RGBA pixels ready for `putImageData`.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Colours each labelled pixel with its class colour. Hidden classes,
/// classes without parameters and background stay transparent; the class
/// opacity scales the pixel alpha.
pub fn rasterize(
    overlay: &SegmentationOverlay,
    classes: &[String],
    params: &HashMap<String, ClassOverlay>,
) -> RgbaImage {
    let palette: Vec<Option<[u8; 4]>> = classes
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let p = params.get(name).filter(|p| p.visible)?;
            let [r, g, b] = class_color_rgb(i);
            let a = (p.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
            Some([r, g, b, a])
        })
        .collect();

    let mut pixels = vec![0u8; overlay.labels.len() * 4];
    for (px, &label) in pixels.chunks_exact_mut(4).zip(&overlay.labels) {
        if label == 0 {
            continue;
        }
        if let Some(Some(rgba)) = palette.get(label as usize - 1) {
            px.copy_from_slice(rgba);
        }
    }
    RgbaImage { width: overlay.width, height: overlay.height, pixels }
}

/// Turns a raw segmentation payload into an overlay.
pub trait SegmentationDecoder {
    fn decode(&self, payload: &[u8]) -> Option<SegmentationOverlay>;
}

/// The only decoder available: recognises nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDecoder;

impl SegmentationDecoder for NoDecoder {
    fn decode(&self, _payload: &[u8]) -> Option<SegmentationOverlay> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["liver".into(), "spleen".into()]
    }

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(SegmentationOverlay::new(2, 2, vec![0; 3]).is_none());
        let overlay = SegmentationOverlay::new(2, 1, vec![0, 1]).unwrap();
        assert!(overlay.visible);
        assert_eq!(overlay.opacity, DEFAULT_OVERLAY_OPACITY);
    }

    #[test]
    fn test_hidden_classes_stay_transparent() {
        let overlay = SegmentationOverlay::new(3, 1, vec![0, 1, 2]).unwrap();
        let mut params = HashMap::new();
        params.insert("liver".to_string(), ClassOverlay { visible: true, opacity: 1.0 });
        params.insert("spleen".to_string(), ClassOverlay { visible: false, opacity: 1.0 });

        let img = rasterize(&overlay, &classes(), &params);
        assert_eq!(&img.pixels[0..4], &[0, 0, 0, 0]);
        assert_eq!(&img.pixels[4..8], &[217, 38, 38, 255]);
        assert_eq!(&img.pixels[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_class_opacity_scales_alpha() {
        let overlay = SegmentationOverlay::new(1, 1, vec![2]).unwrap();
        let mut params = HashMap::new();
        params.insert(
            "spleen".to_string(),
            ClassOverlay::from(ClassState { visible: true, opacity: 50 }),
        );
        let img = rasterize(&overlay, &classes(), &params);
        assert_eq!(img.pixels[3], 128);
    }

    #[test]
    fn test_unknown_label_ignored() {
        let overlay = SegmentationOverlay::new(1, 1, vec![9]).unwrap();
        let img = rasterize(&overlay, &classes(), &HashMap::new());
        assert_eq!(img.pixels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_no_decoder_recognises_nothing() {
        assert!(NoDecoder.decode(b"DICM").is_none());
    }
}
