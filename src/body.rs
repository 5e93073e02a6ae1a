//! Anthropometric body layout projected from the face box.
//!
//! Uses a fixed 8-head figure: the torso hangs below the face in multiples of
//! the face height. Without a face the layout falls back to fixed fractions of
//! the image.

use crate::face::FaceRegion;

/// Vertical anchors and overall extent of the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProportions {
    pub shoulder_y: f64,
    pub chest_y: f64,
    pub waist_y: f64,
    pub body_width: f64,
    pub body_height: f64,
    /// Horizontal body center; `None` when no face was found.
    pub center_x: Option<f64>,
}

impl BodyProportions {
    /// Center used for placement; defaults to half the body width.
    pub fn resolved_center_x(&self) -> f64 {
        self.center_x.unwrap_or(self.body_width / 2.0)
    }
}

pub fn body_proportions(
    face: Option<&FaceRegion>,
    image_width: u32,
    image_height: u32,
) -> BodyProportions {
    match face {
        Some(face) => {
            let body_top = face.center_y + face.height * 0.5;
            BodyProportions {
                shoulder_y: body_top + face.height * 0.5,
                chest_y: body_top + face.height * 1.5,
                waist_y: body_top + face.height * 3.0,
                body_width: face.width * 2.8,
                body_height: face.height * 6.5,
                center_x: Some(face.center_x),
            }
        }
        None => {
            let w = f64::from(image_width);
            let h = f64::from(image_height);
            BodyProportions {
                shoulder_y: h * 0.25,
                chest_y: h * 0.35,
                waist_y: h * 0.55,
                body_width: w * 0.6,
                body_height: h * 0.8,
                center_x: None,
            }
        }
    }
}
