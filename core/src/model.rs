use serde::{Deserialize, Serialize};

/// Pixel rectangle as stored in the metadata: [x, y, width, height].
pub type BoundingBox = [f64; 4];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    pub caption: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// One source image and its captions, as loaded from the metadata file.
/// Immutable after load except for the confidence filter applied at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub file: String,
    pub folder: String,
    pub captions: Vec<Caption>,
}
