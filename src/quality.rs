use image::RgbaImage;

use crate::error::PhotoRejection;

pub const MIN_WIDTH: u32 = 300;
pub const MIN_HEIGHT: u32 = 400;

const DARK_PIXEL: f64 = 30.0;
const BRIGHT_PIXEL: f64 = 240.0;
const MIN_AVERAGE_BRIGHTNESS: f64 = 50.0;
const MAX_AVERAGE_BRIGHTNESS: f64 = 200.0;
const MAX_DARK_RATIO: f64 = 0.7;
const MAX_BRIGHT_RATIO: f64 = 0.3;

/// Brightness statistics of an accepted photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoStats {
    pub width: u32,
    pub height: u32,
    pub average_brightness: f64,
    /// Share of pixels with brightness below 30.
    pub dark_ratio: f64,
    /// Share of pixels with brightness above 240.
    pub bright_ratio: f64,
}

/// Mean of the RGB channels of a pixel.
pub(crate) fn brightness(rgba: [u8; 4]) -> f64 {
    (f64::from(rgba[0]) + f64::from(rgba[1]) + f64::from(rgba[2])) / 3.0
}

/// Check that the photo is large enough and reasonably exposed.
///
/// Checks run in a fixed order: size, average brightness, then the dark and
/// bright pixel ratios. The first failing check decides the rejection.
pub fn validate_photo(photo: &RgbaImage) -> Result<PhotoStats, PhotoRejection> {
    let (width, height) = photo.dimensions();
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(PhotoRejection::TooSmall { width, height });
    }

    let total = f64::from(width) * f64::from(height);
    let mut sum = 0.0;
    let mut dark = 0usize;
    let mut bright = 0usize;
    for px in photo.pixels() {
        let value = brightness(px.0);
        sum += value;
        if value < DARK_PIXEL {
            dark += 1;
        } else if value > BRIGHT_PIXEL {
            bright += 1;
        }
    }

    let stats = PhotoStats {
        width,
        height,
        average_brightness: sum / total,
        dark_ratio: dark as f64 / total,
        bright_ratio: bright as f64 / total,
    };

    if stats.average_brightness < MIN_AVERAGE_BRIGHTNESS {
        return Err(PhotoRejection::TooDark {
            average: stats.average_brightness,
        });
    }
    if stats.average_brightness > MAX_AVERAGE_BRIGHTNESS {
        return Err(PhotoRejection::Overexposed {
            average: stats.average_brightness,
        });
    }
    if stats.dark_ratio > MAX_DARK_RATIO {
        return Err(PhotoRejection::ExcessiveShadow {
            ratio: stats.dark_ratio,
        });
    }
    if stats.bright_ratio > MAX_BRIGHT_RATIO {
        return Err(PhotoRejection::ExcessiveGlare {
            ratio: stats.bright_ratio,
        });
    }

    Ok(stats)
}
