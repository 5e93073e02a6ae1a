pub mod blend;
pub mod body;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod error;
pub mod face;
pub mod loader;
pub mod placeholder;
pub mod placement;
pub mod quality;
pub mod skin;

pub use body::BodyProportions;
pub use catalog::{Offset, Product, TryOnMetadata, Variant};
pub use compositor::{RenderContext, RenderedImage};
pub use config::{LoaderSettings, RenderSettings, ShadowStyle};
pub use error::{FittingError, FittingResult, PersonRejection, PhotoRejection};
pub use face::FaceRegion;
#[cfg(feature = "remote")]
pub use loader::HttpFetcher;
pub use loader::{
    FetchRequest, ImageFetcher, ImageLoader, ImageOrigin, ImageSource, LoadedImage,
};
pub use placement::{Anchor, ClothingPlacement};
pub use quality::PhotoStats;

use std::sync::Arc;

use image::RgbaImage;

use crate::body::body_proportions;
use crate::compositor::composite_garment;
use crate::face::estimate_face;
use crate::placement::resolve_placement;
use crate::quality::validate_photo;
use crate::skin::detect_skin;

/// Environment variable holding the CORS relay endpoint.
pub const ENV_CORS_RELAY: &str = "FITTING_CORS_RELAY";

/// Label given to the result for a product without variants.
pub const DEFAULT_LABEL: &str = "Default";

/// Checkpoints of a try-on run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PhotoLoaded,
    GarmentLoaded,
    PhotoAnalyzed,
    PlacementResolved,
    Composited,
    Encoded,
}

impl Stage {
    /// Overall progress once this stage completes.
    pub fn percent(self) -> u8 {
        match self {
            Stage::PhotoLoaded => 15,
            Stage::GarmentLoaded => 30,
            Stage::PhotoAnalyzed => 55,
            Stage::PlacementResolved => 70,
            Stage::Composited => 90,
            Stage::Encoded => 100,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Stage::PhotoLoaded => "photo loaded",
            Stage::GarmentLoaded => "garment loaded",
            Stage::PhotoAnalyzed => "photo analyzed",
            Stage::PlacementResolved => "placement resolved",
            Stage::Composited => "composited",
            Stage::Encoded => "encoded",
        }
    }
}

/// What the detectors found in a user photo.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAnalysis {
    /// `None` when validation rejected the photo and the run fell back.
    pub stats: Option<PhotoStats>,
    /// Share of skin-toned pixels, when the skin detector ran and accepted.
    pub skin_ratio: Option<f64>,
    pub face: Option<FaceRegion>,
    pub body: BodyProportions,
    /// Reason the default body layout was used instead of a face projection.
    pub fallback_reason: Option<String>,
}

impl PhotoAnalysis {
    pub fn face_detected(&self) -> bool {
        self.face.is_some()
    }
}

/// A successful try-on run.
#[derive(Debug, Clone)]
pub struct TryOnRender {
    pub image: RenderedImage,
    pub face_detected: bool,
    pub face: Option<FaceRegion>,
    pub placement: ClothingPlacement,
    pub body: BodyProportions,
    pub garment_origin: ImageOrigin,
}

/// Outcome of one (photo, product variant) run.
#[derive(Debug)]
pub struct TryOnResult {
    pub label: String,
    pub outcome: FittingResult<TryOnRender>,
}

impl TryOnResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn render(&self) -> Option<&TryOnRender> {
        self.outcome.as_ref().ok()
    }

    /// Human-readable failure reason, if the run failed.
    pub fn message(&self) -> Option<String> {
        self.outcome.as_ref().err().map(ToString::to_string)
    }
}

/// Entry point for configuring and running virtual try-on.
#[derive(Debug, Clone, Default)]
pub struct FittingRoom {
    loader: ImageLoader,
    custom_fetcher: bool,
    render_settings: RenderSettings,
}

impl FittingRoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loader settings, keeping any fetcher set with [`Self::with_fetcher`].
    pub fn with_loader_settings(mut self, settings: LoaderSettings) -> Self {
        self.loader = if self.custom_fetcher {
            self.loader.with_settings(settings)
        } else {
            ImageLoader::new(settings)
        };
        self
    }

    /// Fetch remote images through `fetcher` instead of the built-in HTTP client.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.loader = ImageLoader::with_fetcher(self.loader.settings().clone(), fetcher);
        self.custom_fetcher = true;
        self
    }

    pub fn with_render_settings(mut self, settings: RenderSettings) -> Self {
        self.render_settings = settings;
        self
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    /// Run the validator, skin detector, face estimator and body calculator.
    ///
    /// A too-small photo always fails. Other validation and detection
    /// failures fall back to the default body layout unless strict photo
    /// validation is enabled, in which case validation failures are returned.
    pub fn analyze_photo(&self, photo: &RgbaImage) -> FittingResult<PhotoAnalysis> {
        let (width, height) = photo.dimensions();
        let mut analysis = PhotoAnalysis {
            stats: None,
            skin_ratio: None,
            face: None,
            body: body_proportions(None, width, height),
            fallback_reason: None,
        };

        let detected = validate_photo(photo)
            .map_err(FittingError::from)
            .and_then(|stats| {
                analysis.stats = Some(stats);
                let skin = detect_skin(photo)?;
                analysis.skin_ratio = Some(skin.ratio);
                estimate_face(&skin.pixels, width, height)
            });

        match detected {
            Ok(face) => {
                analysis.face = Some(face);
                analysis.body = body_proportions(Some(&face), width, height);
            }
            Err(FittingError::InvalidPhoto(rejection @ PhotoRejection::TooSmall { .. })) => {
                return Err(FittingError::InvalidPhoto(rejection));
            }
            Err(e @ FittingError::InvalidPhoto(_)) if self.render_settings.strict_photo_validation => {
                return Err(e);
            }
            Err(e) if e.is_detection_failure() => {
                tracing::warn!(error = %e, "face detection failed; using default body layout");
                analysis.fallback_reason = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        tracing::debug!(
            face_detected = analysis.face_detected(),
            shoulder_y = analysis.body.shoulder_y,
            body_width = analysis.body.body_width,
            "photo analyzed"
        );
        Ok(analysis)
    }

    /// Run the full pipeline for one product (or merged variant view).
    pub fn try_on(&self, photo: &ImageSource, product: &Product) -> TryOnResult {
        self.try_on_with_progress(photo, product, &mut |_| {})
    }

    /// Like [`Self::try_on`], reporting each completed [`Stage`].
    pub fn try_on_with_progress(
        &self,
        photo: &ImageSource,
        product: &Product,
        progress: &mut impl FnMut(Stage),
    ) -> TryOnResult {
        let mut ctx = RenderContext::new();
        let outcome = self.run(&mut ctx, photo, product, progress);
        match &outcome {
            Ok(render) => tracing::info!(
                product = %product.id,
                face_detected = render.face_detected,
                bytes = render.image.png.len(),
                "try-on rendered"
            ),
            Err(e) => tracing::warn!(product = %product.id, error = %e, "try-on failed"),
        }
        TryOnResult {
            label: product.name.clone(),
            outcome,
        }
    }

    /// Run once per variant (or once for the base product), keeping failures.
    ///
    /// Results follow variant order and are labeled by variant color or name,
    /// or "Default" when the product has no variants.
    pub fn try_on_each(
        &self,
        photo: &ImageSource,
        product: &Product,
        progress: &mut impl FnMut(&str, Stage),
    ) -> Vec<TryOnResult> {
        if product.variants.is_empty() {
            let mut result =
                self.try_on_with_progress(photo, product, &mut |stage| progress(DEFAULT_LABEL, stage));
            result.label = DEFAULT_LABEL.to_string();
            return vec![result];
        }

        product
            .variants
            .iter()
            .map(|variant| {
                let label = variant.label();
                let merged = product.with_variant(variant);
                let mut result =
                    self.try_on_with_progress(photo, &merged, &mut |stage| progress(&label, stage));
                result.label = label;
                result
            })
            .collect()
    }

    /// Successful results for every variant; failed variants are omitted.
    pub fn try_on_all(&self, photo: &ImageSource, product: &Product) -> Vec<TryOnResult> {
        self.try_on_each(photo, product, &mut |_: &str, _: Stage| {})
            .into_iter()
            .filter(|result| {
                if let Some(message) = result.message() {
                    tracing::warn!(variant = %result.label, error = %message, "variant omitted");
                }
                result.is_success()
            })
            .collect()
    }

    fn run(
        &self,
        ctx: &mut RenderContext,
        photo: &ImageSource,
        product: &Product,
        progress: &mut impl FnMut(Stage),
    ) -> FittingResult<TryOnRender> {
        let photo = self
            .loader
            .load(std::slice::from_ref(photo), None)
            .map_err(|e| FittingError::CompositingFailed(format!("user photo unavailable: {e}")))?
            .image;
        progress(Stage::PhotoLoaded);

        let candidates: Vec<ImageSource> = product
            .garment_candidates()
            .iter()
            .map(|candidate| ImageSource::parse(candidate))
            .collect();
        let garment = self.loader.load(&candidates, Some(product))?;
        progress(Stage::GarmentLoaded);

        let analysis = self.analyze_photo(&photo)?;
        progress(Stage::PhotoAnalyzed);

        let placement = resolve_placement(
            garment.image.dimensions(),
            &analysis.body,
            &product.category,
            product.try_on_metadata.as_ref(),
        );
        tracing::debug!(
            anchor = placement.anchor.as_str(),
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            "placement resolved"
        );
        progress(Stage::PlacementResolved);

        composite_garment(
            ctx,
            &photo,
            &garment.image,
            &placement,
            &product.category,
            &self.render_settings,
        )?;
        progress(Stage::Composited);

        let image = ctx.encode_png()?;
        progress(Stage::Encoded);

        Ok(TryOnRender {
            image,
            face_detected: analysis.face_detected(),
            face: analysis.face,
            placement,
            body: analysis.body,
            garment_origin: garment.origin,
        })
    }
}
