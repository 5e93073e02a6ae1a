use crate::error::FittingError;
use crate::skin::SkinPixel;

const HEAD_CLUSTER_SHARE: f64 = 0.3;
const FACE_WIDTH_SHARE: f64 = 0.15;
const FACE_HEIGHT_SHARE: f64 = 0.2;
const FULL_CONFIDENCE_PIXELS: f64 = 1000.0;
const MIN_CONFIDENCE: f64 = 0.3;

/// Approximate face box derived from the topmost skin cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub top_y: f64,
    /// In [0, 1].
    pub confidence: f64,
}

/// Estimate the face from the upper 30% of skin pixels.
///
/// The box size is a fixed share of the image, not the cluster extent.
pub fn estimate_face(
    skin: &[SkinPixel],
    image_width: u32,
    image_height: u32,
) -> Result<FaceRegion, FittingError> {
    let mut sorted: Vec<&SkinPixel> = skin.iter().collect();
    sorted.sort_by_key(|px| px.y);

    let cluster_len = (sorted.len() as f64 * HEAD_CLUSTER_SHARE).floor() as usize;
    let cluster = &sorted[..cluster_len];
    if cluster.is_empty() {
        return Err(FittingError::FaceNotDetected { confidence: 0.0 });
    }

    let confidence = (cluster.len() as f64 / FULL_CONFIDENCE_PIXELS).min(1.0);
    if confidence < MIN_CONFIDENCE {
        return Err(FittingError::FaceNotDetected { confidence });
    }

    let count = cluster.len() as f64;
    let center_x = cluster.iter().map(|px| f64::from(px.x)).sum::<f64>() / count;
    let center_y = cluster.iter().map(|px| f64::from(px.y)).sum::<f64>() / count;
    let width = f64::from(image_width) * FACE_WIDTH_SHARE;
    let height = f64::from(image_height) * FACE_HEIGHT_SHARE;

    Ok(FaceRegion {
        center_x,
        center_y,
        width,
        height,
        top_y: center_y - height / 2.0,
        confidence,
    })
}
