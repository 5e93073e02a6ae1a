use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::blend::{BlendMode, blend_pixel, draw_over};
use crate::catalog::category_key;
use crate::config::{RenderSettings, ShadowStyle};
use crate::placement::ClothingPlacement;
use crate::{FittingError, FittingResult};

/// Largest garment rectangle accepted, as a multiple of the photo area.
pub const MAX_GARMENT_AREA_RATIO: u64 = 4;

/// Categories that get the multiply contour pass.
pub const CONTOUR_CATEGORIES: &[&str] = &["shirts", "shirt", "t-shirts", "hoodies", "hoodie"];

pub fn needs_contour(category: &str) -> bool {
    let key = category_key(category);
    CONTOUR_CATEGORIES.contains(&key.as_str())
}

/// A color stop: offset in 0.0-1.0, RGB, alpha in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: [u8; 3],
    pub alpha: f32,
}

/// Radial gradient from the center of a rectangle out to half its longer side.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub stops: Vec<GradientStop>,
}

impl RadialGradient {
    /// Transparent center, 30% black at 70% radius, 10% black at the edge.
    pub fn body_contour() -> Self {
        Self {
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: [0, 0, 0],
                    alpha: 0.0,
                },
                GradientStop {
                    offset: 0.7,
                    color: [0, 0, 0],
                    alpha: 0.3,
                },
                GradientStop {
                    offset: 1.0,
                    color: [0, 0, 0],
                    alpha: 0.1,
                },
            ],
        }
    }

    /// Color and alpha at offset `t`; offsets past the ends take the end stops.
    pub fn sample(&self, t: f32) -> ([u8; 3], f32) {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return ([0, 0, 0], 0.0);
        };
        if t <= first.offset {
            return (first.color, first.alpha);
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let k = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
                let lerp = |x: f32, y: f32| x + (y - x) * k;
                let color = [0, 1, 2]
                    .map(|c| lerp(f32::from(a.color[c]), f32::from(b.color[c])).round() as u8);
                return (color, lerp(a.alpha, b.alpha));
            }
        }
        (last.color, last.alpha)
    }
}

/// Mutable drawing state, reset after every garment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeState {
    pub global_alpha: f32,
    pub blend_mode: BlendMode,
    pub shadow: Option<ShadowStyle>,
}

impl Default for CompositeState {
    fn default() -> Self {
        Self {
            global_alpha: 1.0,
            blend_mode: BlendMode::SourceOver,
            shadow: None,
        }
    }
}

/// Exclusively owned drawing surface for one try-on run.
#[derive(Debug, Clone)]
pub struct RenderContext {
    surface: RgbaImage,
    state: CompositeState,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            surface: RgbaImage::new(0, 0),
            state: CompositeState::default(),
        }
    }

    /// Resize to `width` x `height`, clear to transparent, and reset state.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.surface = RgbaImage::new(width, height);
        self.state = CompositeState::default();
    }

    pub fn state(&self) -> &CompositeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CompositeState {
        &mut self.state
    }

    pub fn reset_state(&mut self) {
        self.state = CompositeState::default();
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Draw an image unscaled with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        if let Some(shadow) = self.state.shadow {
            self.draw_shadow(image, x, y, shadow);
        }
        draw_over(
            &mut self.surface,
            image,
            x,
            y,
            self.state.global_alpha,
            self.state.blend_mode,
        );
    }

    /// Scale an image into `(x, y, width, height)` and draw it.
    pub fn draw_image_into(
        &mut self,
        image: &RgbaImage,
        rect: (i64, i64, u32, u32),
        filter: FilterType,
    ) {
        let (x, y, w, h) = rect;
        if w == 0 || h == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        if image.dimensions() == (w, h) {
            self.draw_image(image, x, y);
        } else {
            let scaled = imageops::resize(image, w, h, filter);
            self.draw_image(&scaled, x, y);
        }
    }

    /// Fill a rectangle with a radial gradient centered on it.
    pub fn fill_radial_gradient(&mut self, rect: (i64, i64, u32, u32), gradient: &RadialGradient) {
        let (x, y, w, h) = rect;
        if w == 0 || h == 0 {
            return;
        }
        let cx = x as f32 + w as f32 / 2.0;
        let cy = y as f32 + h as f32 / 2.0;
        let radius = w.max(h) as f32 / 2.0;
        let (sw, sh) = self.surface.dimensions();

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(w)).min(i64::from(sw));
        let y1 = (y + i64::from(h)).min(i64::from(sh));
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                let (color, alpha) = gradient.sample(t);
                blend_pixel(
                    self.surface.get_pixel_mut(px as u32, py as u32),
                    color,
                    alpha * self.state.global_alpha,
                    self.state.blend_mode,
                );
            }
        }
    }

    fn draw_shadow(&mut self, image: &RgbaImage, x: i64, y: i64, shadow: ShadowStyle) {
        let sigma = shadow.blur / 2.0;
        let pad = (sigma * 3.0).ceil().max(0.0) as u32;
        let (w, h) = image.dimensions();
        let mut mask = GrayImage::new(w + pad * 2, h + pad * 2);
        for (ix, iy, px) in image.enumerate_pixels() {
            mask.put_pixel(ix + pad, iy + pad, Luma([px[3]]));
        }
        let mask = if sigma > 0.0 {
            gaussian_blur_f32(&mask, sigma)
        } else {
            mask
        };

        let ox = x + shadow.offset.0 - i64::from(pad);
        let oy = y + shadow.offset.1 - i64::from(pad);
        let (sw, sh) = self.surface.dimensions();
        let strength = shadow.alpha * self.state.global_alpha;
        for (mx, my, m) in mask.enumerate_pixels() {
            if m[0] == 0 {
                continue;
            }
            let dx = ox + i64::from(mx);
            let dy = oy + i64::from(my);
            if dx < 0 || dy < 0 || dx >= i64::from(sw) || dy >= i64::from(sh) {
                continue;
            }
            blend_pixel(
                self.surface.get_pixel_mut(dx as u32, dy as u32),
                shadow.color,
                f32::from(m[0]) / 255.0 * strength,
                self.state.blend_mode,
            );
        }
    }

    /// Serialize the surface as PNG.
    pub fn encode_png(&self) -> FittingResult<RenderedImage> {
        let (width, height) = self.surface.dimensions();
        if width == 0 || height == 0 {
            return Err(FittingError::CompositingFailed(
                "drawing surface is empty".to_string(),
            ));
        }
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(self.surface.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| FittingError::CompositingFailed(format!("PNG encoding failed: {e}")))?;
        Ok(RenderedImage { png, width, height })
    }
}

/// Draw the photo and one garment onto a freshly reset surface.
///
/// The garment goes into the placement rectangle with the configured alpha
/// and drop shadow. Shirts and hoodies also get a multiply contour pass.
/// All compositing state is reset before returning.
pub fn composite_garment(
    ctx: &mut RenderContext,
    photo: &RgbaImage,
    garment: &RgbaImage,
    placement: &ClothingPlacement,
    category: &str,
    settings: &RenderSettings,
) -> FittingResult<()> {
    let (width, height) = photo.dimensions();
    if width == 0 || height == 0 {
        return Err(FittingError::CompositingFailed(
            "user photo has no pixels".to_string(),
        ));
    }

    let rect = placement.pixel_rect();
    let garment_area = u64::from(rect.2) * u64::from(rect.3);
    if garment_area > MAX_GARMENT_AREA_RATIO * u64::from(width) * u64::from(height) {
        return Err(FittingError::CompositingFailed(format!(
            "garment placement {}x{} is too large for a {width}x{height} photo",
            rect.2, rect.3
        )));
    }

    ctx.reset(width, height);
    ctx.draw_image(photo, 0, 0);

    {
        let state = ctx.state_mut();
        state.global_alpha = settings.garment_alpha;
        state.shadow = Some(settings.shadow);
    }
    ctx.draw_image_into(garment, rect, settings.garment_filter);

    if needs_contour(category) {
        let state = ctx.state_mut();
        state.shadow = None;
        state.global_alpha = settings.contour_alpha;
        state.blend_mode = BlendMode::Multiply;
        ctx.fill_radial_gradient(rect, &RadialGradient::body_contour());
    }

    ctx.reset_state();
    Ok(())
}

/// A composited try-on image, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    /// `data:image/png;base64,...` for inline display.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    /// Save the PNG to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> FittingResult<()> {
        std::fs::write(path, &self.png)?;
        Ok(())
    }

    /// Decode the PNG back into pixels.
    pub fn decode(&self) -> FittingResult<RgbaImage> {
        Ok(image::load_from_memory(&self.png)?.to_rgba8())
    }
}
