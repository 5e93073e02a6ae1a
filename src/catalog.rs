//! Product catalog types consumed by the try-on pipeline.
//!
//! These mirror the JSON shapes served by the product service (camelCase keys).
//! The pipeline only ever reads them.

use serde::{Deserialize, Serialize};

use crate::FittingResult;
use crate::placement::Anchor;

/// A pixel offset applied to a placement anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Per-product overrides for garment placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnMetadata {
    /// Explicit anchor; overrides the category default.
    #[serde(default)]
    pub positioning: Option<Anchor>,
    #[serde(default)]
    pub scale_multiplier: Option<f64>,
    #[serde(default)]
    pub shoulder_offset: Option<Offset>,
    #[serde(default)]
    pub waist_offset: Option<Offset>,
}

/// A color-keyed sub-product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Color name shown to the shopper, e.g. "Navy".
    #[serde(default)]
    pub color: Option<String>,
    /// Swatch code such as `#1f2a44`.
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Overlay image drawn onto the photo.
    #[serde(default)]
    pub try_on_image: Option<String>,
}

impl Variant {
    /// Label used for this variant's result: color, then name, then id.
    pub fn label(&self) -> String {
        [self.color.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Semantic garment type such as `shirts`, `dresses` or `bottoms`.
    pub category: String,
    #[serde(default)]
    pub price: f64,
    /// Base display image.
    pub image: String,
    /// Garment images intended for overlay, in preference order.
    #[serde(default)]
    pub try_on_images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub try_on_metadata: Option<TryOnMetadata>,
    /// Fill color for the synthesized placeholder.
    #[serde(default)]
    pub color_code: Option<String>,
}

impl Product {
    /// Parse a single product from JSON.
    pub fn from_json(json: &str) -> FittingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merged view of this product with one of its variants; variant fields win.
    pub fn with_variant(&self, variant: &Variant) -> Product {
        let mut merged = self.clone();
        merged.variants = Vec::new();
        let own_images: Vec<String> = [&variant.try_on_image, &variant.image]
            .into_iter()
            .flatten()
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .collect();
        if !own_images.is_empty() {
            // base overlays belong to another color
            merged.try_on_images = own_images;
        }
        if let Some(image) = &variant.image {
            merged.image = image.clone();
        }
        if variant.color_code.is_some() {
            merged.color_code = variant.color_code.clone();
        }
        merged.name = format!("{} - {}", self.name, variant.label());
        merged
    }

    /// Candidate garment URLs in the order the loader should try them.
    pub fn garment_candidates(&self) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .try_on_images
            .iter()
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .collect();
        if !self.image.trim().is_empty() && !candidates.contains(&self.image) {
            candidates.push(self.image.clone());
        }
        candidates
    }
}

/// Normalized category used for table lookups.
pub fn category_key(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}
