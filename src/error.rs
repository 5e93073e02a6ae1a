use thiserror::Error;

/// Result type alias for operations that may fail with [`FittingError`].
pub type FittingResult<T> = std::result::Result<T, FittingError>;

/// Error types that can occur during a try-on run.
///
/// The first five variants are the conditions a caller can act on; the rest
/// carry failures from image decoding, I/O, fetching and catalog parsing.
#[derive(Debug, Error)]
pub enum FittingError {
    /// Every candidate source failed and no placeholder could stand in.
    #[error("Image could not be loaded from any of {attempted} candidate source(s)")]
    ImageLoadFailed { attempted: usize },
    /// The photo was rejected by the quality validator.
    #[error("Invalid photo: {0}")]
    InvalidPhoto(#[from] PhotoRejection),
    /// The skin detector found no plausible person.
    #[error("Person not detected: {0}")]
    PersonNotDetected(#[from] PersonRejection),
    /// The face estimator had no cluster or too little confidence.
    #[error("Face not detected (confidence {confidence:.2})")]
    FaceNotDetected { confidence: f64 },
    /// Drawing or serializing the composite failed.
    #[error("Compositing failed: {0}")]
    CompositingFailed(String),
    /// Image loading, decoding, or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A single fetch attempt failed.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    /// A `data:` URI could not be decoded.
    #[error("Malformed data URI: {0}")]
    DataUri(String),
    /// Product JSON could not be parsed.
    #[error("Catalog parse failed: {0}")]
    Catalog(#[from] serde_json::Error),
}

/// Reasons the quality validator rejects a photo.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PhotoRejection {
    #[error("photo must be at least 300x400 pixels (got {width}x{height})")]
    TooSmall { width: u32, height: u32 },
    #[error("photo is too dark (average brightness {average:.0}, minimum 50)")]
    TooDark { average: f64 },
    #[error("photo is overexposed (average brightness {average:.0}, maximum 200)")]
    Overexposed { average: f64 },
    #[error("photo has excessive shadow ({:.0}% of pixels are very dark)", pct(.ratio))]
    ExcessiveShadow { ratio: f64 },
    #[error("photo has excessive glare ({:.0}% of pixels are blown out)", pct(.ratio))]
    ExcessiveGlare { ratio: f64 },
}

/// Reasons the skin detector rejects a photo.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PersonRejection {
    #[error(
        "no person detected ({skin_pixels} skin-toned pixels, {:.1}% of the frame); move closer to the camera",
        pct(.ratio)
    )]
    NoPersonDetected { skin_pixels: usize, ratio: f64 },
    #[error("too much exposed skin in the frame ({:.0}%)", pct(.ratio))]
    ExcessiveSkinExposure { ratio: f64 },
}

fn pct(ratio: &f64) -> f64 {
    ratio * 100.0
}

impl FittingError {
    /// Whether the orchestrator downgrades this failure to a run without a face region.
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            FittingError::InvalidPhoto(_)
                | FittingError::PersonNotDetected(_)
                | FittingError::FaceNotDetected { .. }
        )
    }
}
