use image::{Rgba, RgbaImage};

/// How a source color combines with the backdrop before alpha compositing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Plain Porter-Duff "over".
    #[default]
    SourceOver,
    /// Backdrop and source colors are multiplied where they overlap.
    Multiply,
}

/// Composite a straight-alpha source color onto one destination pixel.
///
/// `src_alpha` is the effective source opacity in 0.0-1.0 (pixel alpha times
/// any global alpha). Colors stay straight (non-premultiplied) in the output.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: [u8; 3], src_alpha: f32, mode: BlendMode) {
    let src_a = src_alpha.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mut rgba = [0u8; 4];
    if out_a > 0.0 {
        for c in 0..3 {
            let cs = f32::from(src[c]) / 255.0;
            let cb = f32::from(dst[c]) / 255.0;
            let mixed = match mode {
                BlendMode::SourceOver => cs,
                BlendMode::Multiply => (1.0 - dst_a) * cs + dst_a * cs * cb,
            };
            let blended = (src_a * mixed + dst_a * (1.0 - src_a) * cb) / out_a;
            rgba[c] = (blended * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    rgba[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(rgba);
}

/// Draw `top` onto `surface` with its top-left corner at `(x, y)`, clipped to the surface.
pub fn draw_over(
    surface: &mut RgbaImage,
    top: &RgbaImage,
    x: i64,
    y: i64,
    global_alpha: f32,
    mode: BlendMode,
) {
    let (sw, sh) = surface.dimensions();
    for (tx, ty, px) in top.enumerate_pixels() {
        let dx = x + i64::from(tx);
        let dy = y + i64::from(ty);
        if dx < 0 || dy < 0 || dx >= i64::from(sw) || dy >= i64::from(sh) {
            continue;
        }
        let alpha = f32::from(px[3]) / 255.0 * global_alpha;
        blend_pixel(
            surface.get_pixel_mut(dx as u32, dy as u32),
            [px[0], px[1], px[2]],
            alpha,
            mode,
        );
    }
}
