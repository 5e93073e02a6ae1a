//! Synthesized stand-in garments for products whose images cannot be loaded.
//!
//! Shapes are laid out in a 400x500 design space and scaled to the requested
//! raster. The background stays transparent so the result composites like a
//! real cut-out garment.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::catalog::{Product, category_key};

pub const DESIGN_WIDTH: u32 = 400;
pub const DESIGN_HEIGHT: u32 = 500;
pub const DEFAULT_PLACEHOLDER_COLOR: [u8; 3] = [0x6b, 0x72, 0x80];

/// One filled rectangle in design-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

const fn fill(x: i32, y: i32, width: u32, height: u32) -> FillRect {
    FillRect {
        x,
        y,
        width,
        height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Silhouette {
    Shirt,
    Dress,
    Pants,
    Plain,
}

const CATEGORY_SILHOUETTES: &[(&str, Silhouette)] = &[
    ("shirts", Silhouette::Shirt),
    ("tops", Silhouette::Shirt),
    ("hoodies", Silhouette::Shirt),
    ("sweaters", Silhouette::Shirt),
    ("jackets", Silhouette::Shirt),
    ("dresses", Silhouette::Dress),
    ("bottoms", Silhouette::Pants),
    ("jeans", Silhouette::Pants),
    ("pants", Silhouette::Pants),
    ("shorts", Silhouette::Pants),
];

pub fn silhouette_for(category: &str) -> Silhouette {
    let key = category_key(category);
    CATEGORY_SILHOUETTES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, s)| *s)
        .unwrap_or(Silhouette::Plain)
}

pub fn shirt_shape() -> Vec<FillRect> {
    vec![
        fill(100, 80, 200, 340),
        fill(30, 80, 70, 130),
        fill(300, 80, 70, 130),
    ]
}

pub fn dress_shape() -> Vec<FillRect> {
    vec![
        fill(140, 60, 120, 150),
        fill(115, 210, 170, 110),
        fill(85, 320, 230, 120),
    ]
}

pub fn pants_shape() -> Vec<FillRect> {
    vec![
        fill(110, 60, 180, 40),
        fill(110, 100, 85, 340),
        fill(205, 100, 85, 340),
    ]
}

pub fn plain_shape() -> Vec<FillRect> {
    vec![fill(80, 60, 240, 380)]
}

impl Silhouette {
    pub fn shapes(self) -> Vec<FillRect> {
        match self {
            Silhouette::Shirt => shirt_shape(),
            Silhouette::Dress => dress_shape(),
            Silhouette::Pants => pants_shape(),
            Silhouette::Plain => plain_shape(),
        }
    }

    /// Area the product name is centered in.
    fn label_band(self) -> FillRect {
        match self {
            Silhouette::Shirt => fill(100, 240, 200, 20),
            Silhouette::Dress => fill(140, 125, 120, 20),
            Silhouette::Pants => fill(110, 70, 180, 20),
            Silhouette::Plain => fill(80, 240, 240, 20),
        }
    }
}

/// What the placeholder needs to know about a product.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderStyle {
    pub name: String,
    pub category: String,
    pub color: [u8; 3],
}

impl From<&Product> for PlaceholderStyle {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            color: product
                .color_code
                .as_deref()
                .and_then(parse_color_code)
                .unwrap_or(DEFAULT_PLACEHOLDER_COLOR),
        }
    }
}

/// Parse `#rgb` or `#rrggbb` (the `#` is optional).
pub fn parse_color_code(code: &str) -> Option<[u8; 3]> {
    let hex = code.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// Black on light fills, white on dark ones.
fn label_color([r, g, b]: [u8; 3]) -> [u8; 3] {
    let luminance = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    if luminance > 140.0 { [0, 0, 0] } else { [255, 255, 255] }
}

/// Render the placeholder garment described by `style` at `size`.
pub fn render_placeholder(style: &PlaceholderStyle, size: (u32, u32)) -> RgbaImage {
    let (w, h) = (size.0.max(1), size.1.max(1));
    let mut canvas = RgbaImage::new(w, h);
    let sx = w as f32 / DESIGN_WIDTH as f32;
    let sy = h as f32 / DESIGN_HEIGHT as f32;
    let [r, g, b] = style.color;

    let silhouette = silhouette_for(&style.category);
    for shape in silhouette.shapes() {
        if let Some(rect) = scale_rect(shape, sx, sy) {
            draw_filled_rect_mut(&mut canvas, rect, Rgba([r, g, b, 255]));
        }
    }

    let band = silhouette.label_band();
    let glyph_scale = ((4.0 * sx.min(sy)).round() as u32).max(1);
    draw_label(
        &mut canvas,
        &style.name,
        scale_band(band, sx, sy),
        glyph_scale,
        label_color(style.color),
    );
    canvas
}

fn scale_rect(shape: FillRect, sx: f32, sy: f32) -> Option<Rect> {
    let width = (shape.width as f32 * sx).round() as u32;
    let height = (shape.height as f32 * sy).round() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    let x = (shape.x as f32 * sx).round() as i32;
    let y = (shape.y as f32 * sy).round() as i32;
    Some(Rect::at(x, y).of_size(width, height))
}

fn scale_band(band: FillRect, sx: f32, sy: f32) -> FillRect {
    FillRect {
        x: (band.x as f32 * sx).round() as i32,
        y: (band.y as f32 * sy).round() as i32,
        width: (band.width as f32 * sx).round() as u32,
        height: (band.height as f32 * sy).round() as u32,
    }
}

// 3x5 glyphs, one row per entry, bit 2 is the leftmost column.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [2, 5, 7, 5, 5],
        'B' => [6, 5, 6, 5, 6],
        'C' => [3, 4, 4, 4, 3],
        'D' => [6, 5, 5, 5, 6],
        'E' => [7, 4, 6, 4, 7],
        'F' => [7, 4, 6, 4, 4],
        'G' => [3, 4, 5, 5, 3],
        'H' => [5, 5, 7, 5, 5],
        'I' => [7, 2, 2, 2, 7],
        'J' => [1, 1, 1, 5, 2],
        'K' => [5, 5, 6, 5, 5],
        'L' => [4, 4, 4, 4, 7],
        'M' => [5, 7, 7, 5, 5],
        'N' => [6, 5, 5, 5, 5],
        'O' => [2, 5, 5, 5, 2],
        'P' => [6, 5, 6, 4, 4],
        'Q' => [2, 5, 5, 6, 3],
        'R' => [6, 5, 6, 5, 5],
        'S' => [3, 4, 2, 1, 6],
        'T' => [7, 2, 2, 2, 2],
        'U' => [5, 5, 5, 5, 7],
        'V' => [5, 5, 5, 5, 2],
        'W' => [5, 5, 7, 7, 5],
        'X' => [5, 5, 2, 5, 5],
        'Y' => [5, 5, 2, 2, 2],
        'Z' => [7, 1, 2, 4, 7],
        '0' => [7, 5, 5, 5, 7],
        '1' => [2, 6, 2, 2, 7],
        '2' => [6, 1, 2, 4, 7],
        '3' => [6, 1, 2, 1, 6],
        '4' => [5, 5, 7, 1, 1],
        '5' => [7, 4, 6, 1, 6],
        '6' => [3, 4, 7, 5, 7],
        '7' => [7, 1, 2, 4, 4],
        '8' => [7, 5, 7, 5, 7],
        '9' => [7, 5, 7, 1, 6],
        ' ' => [0, 0, 0, 0, 0],
        '-' => [0, 0, 7, 0, 0],
        '.' => [0, 0, 0, 0, 2],
        '\'' => [2, 2, 0, 0, 0],
        '&' => [2, 5, 2, 5, 3],
        '/' => [1, 1, 2, 4, 4],
        _ => [6, 1, 2, 0, 2],
    }
}

/// Draw `text` centered in `band`, truncated to fit its width.
fn draw_label(canvas: &mut RgbaImage, text: &str, band: FillRect, scale: u32, color: [u8; 3]) {
    let advance = 4 * scale;
    let max_chars = (band.width / advance) as usize;
    let chars: Vec<char> = text.trim().chars().take(max_chars).collect();
    if chars.is_empty() {
        return;
    }
    let text_width = chars.len() as u32 * advance - scale;
    let x0 = band.x + (band.width.saturating_sub(text_width) / 2) as i32;
    let y0 = band.y + (band.height.saturating_sub(5 * scale) / 2) as i32;
    let [r, g, b] = color;

    for (i, c) in chars.iter().enumerate() {
        let cx = x0 + (i as u32 * advance) as i32;
        for (row, bits) in glyph(*c).iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    cx + (col * scale) as i32,
                    y0 + (row as u32 * scale) as i32,
                )
                .of_size(scale, scale);
                draw_filled_rect_mut(canvas, rect, Rgba([r, g, b, 255]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(category: &str, color: [u8; 3]) -> PlaceholderStyle {
        PlaceholderStyle {
            name: "Tee".into(),
            category: category.into(),
            color,
        }
    }

    mod silhouette_for {
        use super::*;

        #[test]
        fn categories_map_to_shapes() {
            assert_eq!(silhouette_for("Shirts"), Silhouette::Shirt);
            assert_eq!(silhouette_for("hoodies"), Silhouette::Shirt);
            assert_eq!(silhouette_for("dresses"), Silhouette::Dress);
            assert_eq!(silhouette_for("jeans"), Silhouette::Pants);
            assert_eq!(silhouette_for("accessories"), Silhouette::Plain);
        }

        #[test]
        fn shapes_stay_inside_design_space() {
            for s in [
                Silhouette::Shirt,
                Silhouette::Dress,
                Silhouette::Pants,
                Silhouette::Plain,
            ] {
                for r in s.shapes() {
                    assert!(r.x >= 0 && r.y >= 0);
                    assert!(r.x as u32 + r.width <= DESIGN_WIDTH);
                    assert!(r.y as u32 + r.height <= DESIGN_HEIGHT);
                }
            }
        }

        #[test]
        fn shape_generators_are_pure() {
            assert_eq!(shirt_shape(), shirt_shape());
            assert_eq!(Silhouette::Dress.shapes(), dress_shape());
        }
    }

    mod parse_color_code {
        use super::*;

        #[test]
        fn long_and_short_forms() {
            assert_eq!(parse_color_code("#1f2a44"), Some([0x1f, 0x2a, 0x44]));
            assert_eq!(parse_color_code("FFF"), Some([255, 255, 255]));
            assert_eq!(parse_color_code(" #0a0 "), Some([0, 170, 0]));
        }

        #[test]
        fn rejects_garbage() {
            assert_eq!(parse_color_code("#12345"), None);
            assert_eq!(parse_color_code("#gggggg"), None);
            assert_eq!(parse_color_code("navy"), None);
            assert_eq!(parse_color_code("#éé"), None);
        }
    }

    mod render_placeholder {
        use super::*;

        #[test]
        fn has_requested_size_and_transparent_corners() {
            let img = render_placeholder(&style("shirts", [200, 0, 0]), (400, 500));
            assert_eq!(img.dimensions(), (400, 500));
            assert_eq!(img.get_pixel(0, 0)[3], 0);
            assert_eq!(img.get_pixel(399, 499)[3], 0);
        }

        #[test]
        fn shirt_body_and_sleeves_are_filled() {
            let img = render_placeholder(&style("shirts", [200, 0, 0]), (400, 500));
            assert_eq!(img.get_pixel(200, 400).0, [200, 0, 0, 255]);
            assert_eq!(img.get_pixel(40, 100).0, [200, 0, 0, 255]);
            // below the sleeve
            assert_eq!(img.get_pixel(40, 300)[3], 0);
        }

        #[test]
        fn pants_have_a_gap_between_legs() {
            let img = render_placeholder(&style("pants", [0, 0, 200]), (400, 500));
            assert_eq!(img.get_pixel(200, 300)[3], 0);
            assert_eq!(img.get_pixel(150, 300).0, [0, 0, 200, 255]);
        }

        #[test]
        fn label_is_drawn_in_contrasting_color() {
            let dark = render_placeholder(&style("unknown", [20, 20, 20]), (400, 500));
            assert!(dark.pixels().any(|p| p.0 == [255, 255, 255, 255]));
            let light = render_placeholder(&style("unknown", [240, 240, 240]), (400, 500));
            assert!(light.pixels().any(|p| p.0 == [0, 0, 0, 255]));
        }

        #[test]
        fn is_deterministic() {
            let a = render_placeholder(&style("dresses", [10, 120, 90]), (200, 250));
            let b = render_placeholder(&style("dresses", [10, 120, 90]), (200, 250));
            assert_eq!(a, b);
        }

        #[test]
        fn tiny_raster_does_not_panic() {
            let img = render_placeholder(&style("shirts", [1, 2, 3]), (1, 1));
            assert_eq!(img.dimensions(), (1, 1));
            let img = render_placeholder(&style("shirts", [1, 2, 3]), (0, 0));
            assert_eq!(img.dimensions(), (1, 1));
        }

        #[test]
        fn style_from_product_uses_color_or_default() {
            let mut product = Product {
                name: "Tee".into(),
                category: "shirts".into(),
                ..Product::default()
            };
            assert_eq!(PlaceholderStyle::from(&product).color, DEFAULT_PLACEHOLDER_COLOR);
            product.color_code = Some("#00ff00".into());
            assert_eq!(PlaceholderStyle::from(&product).color, [0, 255, 0]);
            product.color_code = Some("teal".into());
            assert_eq!(PlaceholderStyle::from(&product).color, DEFAULT_PLACEHOLDER_COLOR);
        }
    }
}
