use std::ops::RangeInclusive;

use image::RgbaImage;

use crate::error::PersonRejection;
use crate::quality::brightness;

/// An RGB cuboid of plausible skin colors.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinToneBand {
    pub name: &'static str,
    pub red: RangeInclusive<u8>,
    pub green: RangeInclusive<u8>,
    pub blue: RangeInclusive<u8>,
}

impl SkinToneBand {
    pub fn contains(&self, [r, g, b]: [u8; 3]) -> bool {
        self.red.contains(&r) && self.green.contains(&g) && self.blue.contains(&b)
    }
}

/// Light, medium and dark tones, two sub-ranges each.
pub const SKIN_TONE_BANDS: [SkinToneBand; 6] = [
    SkinToneBand {
        name: "light-a",
        red: 220..=255,
        green: 170..=230,
        blue: 140..=210,
    },
    SkinToneBand {
        name: "light-b",
        red: 195..=240,
        green: 140..=200,
        blue: 110..=180,
    },
    SkinToneBand {
        name: "medium-a",
        red: 170..=220,
        green: 110..=170,
        blue: 80..=140,
    },
    SkinToneBand {
        name: "medium-b",
        red: 140..=190,
        green: 90..=140,
        blue: 60..=120,
    },
    SkinToneBand {
        name: "dark-a",
        red: 95..=150,
        green: 60..=110,
        blue: 40..=90,
    },
    SkinToneBand {
        name: "dark-b",
        red: 60..=110,
        green: 35..=80,
        blue: 20..=65,
    },
];

const MIN_CHANNEL_SPREAD: u8 = 10;
const MIN_SKIN_PIXELS: usize = 500;
const MIN_SKIN_RATIO: f64 = 0.05;
const MAX_SKIN_RATIO: f64 = 0.4;

/// One pixel classified as skin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinPixel {
    pub x: u32,
    pub y: u32,
    /// Mean of the RGB channels.
    pub intensity: f64,
    pub rgb: [u8; 3],
}

/// Skin pixels of a photo that plausibly contains a person.
#[derive(Debug, Clone)]
pub struct SkinDetection {
    /// Skin pixels in row-major scan order.
    pub pixels: Vec<SkinPixel>,
    pub total_pixels: usize,
    pub ratio: f64,
}

/// Secondary checks that reject flat grays and implausible channel balances.
fn passes_secondary_checks([r, g, b]: [u8; 3]) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max - min <= MIN_CHANNEL_SPREAD || r <= b {
        return false;
    }
    let red = f64::from(r);
    let green_ratio = f64::from(g) / red;
    let blue_ratio = f64::from(b) / red;
    green_ratio > 0.4 && green_ratio < 1.2 && blue_ratio > 0.3 && blue_ratio < 1.0
}

/// Whether a color falls in any skin-tone band and passes the secondary checks.
pub fn is_skin_tone(rgb: [u8; 3]) -> bool {
    SKIN_TONE_BANDS.iter().any(|band| band.contains(rgb)) && passes_secondary_checks(rgb)
}

/// Classify every pixel and decide whether a person is plausibly in frame.
pub fn detect_skin(photo: &RgbaImage) -> Result<SkinDetection, PersonRejection> {
    let (w, h) = photo.dimensions();
    let total_pixels = (w as usize) * (h as usize);

    let pixels: Vec<SkinPixel> = photo
        .enumerate_pixels()
        .filter_map(|(x, y, px)| {
            let rgb = [px[0], px[1], px[2]];
            is_skin_tone(rgb).then(|| SkinPixel {
                x,
                y,
                intensity: brightness(px.0),
                rgb,
            })
        })
        .collect();

    let ratio = if total_pixels == 0 {
        0.0
    } else {
        pixels.len() as f64 / total_pixels as f64
    };

    if pixels.len() < MIN_SKIN_PIXELS || ratio < MIN_SKIN_RATIO {
        return Err(PersonRejection::NoPersonDetected {
            skin_pixels: pixels.len(),
            ratio,
        });
    }
    if ratio > MAX_SKIN_RATIO {
        return Err(PersonRejection::ExcessiveSkinExposure { ratio });
    }

    Ok(SkinDetection {
        pixels,
        total_pixels,
        ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const SKIN: [u8; 3] = [200, 150, 120];
    const BACKGROUND: [u8; 3] = [120, 120, 120];

    fn photo_with_skin_rows(w: u32, h: u32, skin_rows: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |_, y| {
            let [r, g, b] = if y < skin_rows { SKIN } else { BACKGROUND };
            Rgba([r, g, b, 255])
        })
    }

    mod is_skin_tone {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn typical_tones_are_skin() {
                assert!(is_skin_tone([230, 190, 160]));
                assert!(is_skin_tone(SKIN));
                assert!(is_skin_tone([160, 110, 80]));
                assert!(is_skin_tone([100, 70, 50]));
            }

            #[test]
            fn flat_gray_fails_spread_check() {
                assert!(!is_skin_tone([200, 195, 192]));
                assert!(!is_skin_tone(BACKGROUND));
            }

            #[test]
            fn saturated_primaries_are_not_skin() {
                assert!(!is_skin_tone([0, 0, 255]));
                assert!(!is_skin_tone([255, 0, 0]));
                assert!(!is_skin_tone([0, 255, 0]));
            }

            #[test]
            fn in_band_but_too_flat_is_rejected() {
                assert!(SKIN_TONE_BANDS[1].contains([200, 195, 190]));
                assert!(!is_skin_tone([200, 195, 190]));
            }

            #[test]
            fn in_band_but_green_heavy_is_rejected() {
                // dark-b allows g/r up to 80/60
                assert!(SKIN_TONE_BANDS[5].contains([60, 75, 30]));
                assert!(!is_skin_tone([60, 75, 30]));
            }

            #[test]
            fn bands_are_ordered_light_to_dark() {
                let names: Vec<_> = SKIN_TONE_BANDS.iter().map(|b| b.name).collect();
                assert_eq!(
                    names,
                    ["light-a", "light-b", "medium-a", "medium-b", "dark-a", "dark-b"]
                );
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// is_skin_tone: any accepted color has red above blue and a visible spread
                #[test]
                fn accepted_colors_satisfy_secondary_checks(
                    r in proptest::num::u8::ANY,
                    g in proptest::num::u8::ANY,
                    b in proptest::num::u8::ANY
                ) {
                    if is_skin_tone([r, g, b]) {
                        prop_assert!(r > b);
                        prop_assert!(r.max(g).max(b) - r.min(g).min(b) > 10);
                    }
                }
            }
        }
    }

    mod detect_skin {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn solid_blue_has_no_person() {
                let photo = RgbaImage::from_pixel(300, 400, Rgba([0, 0, 255, 255]));
                let err = detect_skin(&photo).unwrap_err();
                assert_eq!(
                    err,
                    PersonRejection::NoPersonDetected {
                        skin_pixels: 0,
                        ratio: 0.0
                    }
                );
            }

            #[test]
            fn half_skin_frame_is_excessive_exposure() {
                let photo = photo_with_skin_rows(300, 400, 200);
                let err = detect_skin(&photo).unwrap_err();
                assert_eq!(err, PersonRejection::ExcessiveSkinExposure { ratio: 0.5 });
            }

            #[test]
            fn tiny_skin_patch_is_too_far() {
                // 300 skin pixels, under the absolute minimum
                let photo = photo_with_skin_rows(300, 400, 1);
                let err = detect_skin(&photo).unwrap_err();
                assert!(matches!(
                    err,
                    PersonRejection::NoPersonDetected { skin_pixels: 300, .. }
                ));
            }

            #[test]
            fn enough_pixels_but_low_ratio_is_too_far() {
                // 4% of the frame: above 500 pixels but below the 5% ratio
                let photo = photo_with_skin_rows(300, 400, 16);
                let err = detect_skin(&photo).unwrap_err();
                assert!(matches!(
                    err,
                    PersonRejection::NoPersonDetected { skin_pixels: 4800, .. }
                ));
            }

            #[test]
            fn plausible_person_returns_pixels_in_scan_order() {
                // 10% of the frame
                let photo = photo_with_skin_rows(300, 400, 40);
                let detection = detect_skin(&photo).unwrap();
                assert_eq!(detection.pixels.len(), 12_000);
                assert_eq!(detection.total_pixels, 120_000);
                assert!((detection.ratio - 0.1).abs() < 1e-12);

                let first = detection.pixels[0];
                assert_eq!((first.x, first.y), (0, 0));
                assert_eq!(first.rgb, SKIN);
                assert!((first.intensity - 470.0 / 3.0).abs() < 1e-9);
                let last = detection.pixels.last().unwrap();
                assert_eq!((last.x, last.y), (299, 39));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                #![proptest_config(ProptestConfig::with_cases(16))]

                /// detect_skin: uniform non-skin frames never contain a person
                #[test]
                fn uniform_non_skin_never_detects(
                    r in proptest::num::u8::ANY,
                    g in proptest::num::u8::ANY,
                    b in proptest::num::u8::ANY
                ) {
                    prop_assume!(!is_skin_tone([r, g, b]));
                    let photo = RgbaImage::from_pixel(300, 400, Rgba([r, g, b, 255]));
                    let is_no_person = matches!(
                        detect_skin(&photo),
                        Err(PersonRejection::NoPersonDetected { .. })
                    );
                    prop_assert!(is_no_person);
                }
            }
        }
    }
}
