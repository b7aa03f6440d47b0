pub mod colors;
pub mod overlay;
pub mod store;

pub use colors::{class_color_css, class_color_rgb};
pub use overlay::{ClassOverlay, NoDecoder, SegmentationDecoder, SegmentationOverlay};
pub use store::{ClassChange, ClassChangeSink, ClassPatch, ClassState, ClassVisibilityStore};
