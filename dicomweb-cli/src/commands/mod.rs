pub mod instances;
pub mod probe;
pub mod segmentation;
pub mod series;
pub mod studies;
