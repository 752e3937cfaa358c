use std::sync::Arc;

use kurbo::Shape;

use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::lerp_clamped;

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn color(rgba: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ReelError::render("pixmap byte len mismatch"));
    }
    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// Wrap premultiplied pixels as an image paint.
pub(crate) fn premul_image(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Radial darkening: transparent inside `inner_r`, ramping linearly to `max_alpha` black at
/// `outer_r`, both measured from the canvas center.
pub(crate) fn vignette_rgba8(canvas: Canvas, inner_r: f64, outer_r: f64, max_alpha: f64) -> Vec<u8> {
    let (w, h) = (canvas.width as usize, canvas.height as usize);
    let (cx, cy) = (canvas.width_f64() / 2.0, canvas.height_f64() / 2.0);
    let span = (outer_r - inner_r).max(f64::EPSILON);
    let mut out = vec![0u8; w * h * 4];
    for y in 0..h {
        let dy = y as f64 + 0.5 - cy;
        for x in 0..w {
            let dx = x as f64 + 0.5 - cx;
            let d = (dx * dx + dy * dy).sqrt();
            let a = lerp_clamped(0.0, max_alpha, (d - inner_r) / span);
            // premultiplied black: only alpha is non-zero
            out[(y * w + x) * 4 + 3] = (a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

pub(crate) fn rounded_rect_path(
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    radius: f64,
) -> vello_cpu::kurbo::BezPath {
    let rr = kurbo::RoundedRect::new(x, y, x + w, y + h, radius);
    let mut p = vello_cpu::kurbo::BezPath::new();
    for el in rr.path_elements(0.1) {
        p.push(el);
    }
    p
}

#[cfg(test)]
#[path = "../../tests/unit/render/paint.rs"]
mod tests;
