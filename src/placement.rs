use serde::{Deserialize, Serialize};

use crate::body::BodyProportions;
use crate::catalog::{TryOnMetadata, category_key};

/// Named body location a garment is placed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Face,
    Shoulders,
    Chest,
    Waist,
    FullBody,
}

impl Anchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::Face => "face",
            Anchor::Shoulders => "shoulders",
            Anchor::Chest => "chest",
            Anchor::Waist => "waist",
            Anchor::FullBody => "full_body",
        }
    }
}

/// Default anchor per garment category. Unlisted categories use [`Anchor::Chest`].
pub const CATEGORY_ANCHORS: &[(&str, Anchor)] = &[
    ("shirts", Anchor::Shoulders),
    ("tops", Anchor::Shoulders),
    ("hoodies", Anchor::Shoulders),
    ("sweaters", Anchor::Shoulders),
    ("jackets", Anchor::Shoulders),
    ("dresses", Anchor::FullBody),
    ("bottoms", Anchor::Waist),
    ("jeans", Anchor::Waist),
    ("pants", Anchor::Waist),
    ("shorts", Anchor::Waist),
    ("accessories", Anchor::Face),
    ("glasses", Anchor::Face),
    ("hats", Anchor::Face),
];

/// Look up the default anchor for a category (case-insensitive).
pub fn anchor_for_category(category: &str) -> Anchor {
    let key = category_key(category);
    CATEGORY_ANCHORS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, anchor)| *anchor)
        .unwrap_or(Anchor::Chest)
}

/// Target rectangle for drawing one garment image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClothingPlacement {
    pub anchor: Anchor,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClothingPlacement {
    /// Rectangle snapped to whole pixels: `(x, y, width, height)`.
    pub fn pixel_rect(&self) -> (i64, i64, u32, u32) {
        let to_size = |v: f64| if v.is_finite() && v > 0.0 { v.round() as u32 } else { 0 };
        (
            self.x.round() as i64,
            self.y.round() as i64,
            to_size(self.width),
            to_size(self.height),
        )
    }
}

/// Compute where a garment of `garment_size` goes on the body.
pub fn resolve_placement(
    garment_size: (u32, u32),
    body: &BodyProportions,
    category: &str,
    metadata: Option<&TryOnMetadata>,
) -> ClothingPlacement {
    let anchor = metadata
        .and_then(|m| m.positioning)
        .unwrap_or_else(|| anchor_for_category(category));
    let scale = metadata.and_then(|m| m.scale_multiplier).unwrap_or(1.0);
    // offsets only shift vertically; x stays centered on the body
    let shoulder_dy = metadata
        .and_then(|m| m.shoulder_offset)
        .map_or(0.0, |o| o.y);
    let waist_dy = metadata.and_then(|m| m.waist_offset).map_or(0.0, |o| o.y);

    let (gw, gh) = garment_size;
    let aspect = if gw == 0 {
        1.0
    } else {
        f64::from(gh) / f64::from(gw)
    };
    let center_x = body.resolved_center_x();

    let centered = |width: f64, height: f64, y: f64| ClothingPlacement {
        anchor,
        x: center_x - width / 2.0,
        y,
        width,
        height,
    };

    match anchor {
        Anchor::Face => {
            let width = body.body_width * 0.2 * scale;
            centered(width, width * 0.6, body.shoulder_y * 0.3)
        }
        Anchor::Shoulders => {
            let width = body.body_width * scale;
            centered(width, width * aspect, body.shoulder_y + shoulder_dy)
        }
        Anchor::Chest => {
            let width = body.body_width * scale;
            centered(width, width * aspect, body.chest_y + shoulder_dy)
        }
        Anchor::Waist => {
            let width = body.body_width * 0.9 * scale;
            centered(width, width * aspect, body.waist_y + waist_dy)
        }
        Anchor::FullBody => {
            let width = body.body_width * scale;
            centered(width, body.body_height * 0.9, body.shoulder_y)
        }
    }
}
