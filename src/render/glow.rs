use crate::foundation::error::{ReelError, ReelResult};

/// Soft drop-glow for a rounded rectangle, pre-blurred into a sprite.
#[derive(Clone, Debug)]
pub(crate) struct GlowSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Space between the sprite edge and the rectangle it surrounds.
    pub(crate) pad: u32,
    pub(crate) rgba8_premul: Vec<u8>,
}

/// Build a glow around a `rect_w`×`rect_h` rounded rectangle.
///
/// `color` is premultiplied; `blur_px` plays the role of a canvas `shadowBlur`.
pub(crate) fn glow_sprite(
    rect_w: u32,
    rect_h: u32,
    corner_radius: f32,
    blur_px: u32,
    color: [u8; 4],
) -> ReelResult<GlowSprite> {
    if rect_w == 0 || rect_h == 0 {
        return Err(ReelError::validation("glow rect must be non-empty"));
    }
    let pad = blur_px.saturating_mul(2);
    let width = rect_w + pad * 2;
    let height = rect_h + pad * 2;

    let mut mask = vec![0u8; (width as usize) * (height as usize) * 4];
    let r = corner_radius.max(0.0).min(rect_w.min(rect_h) as f32 / 2.0);
    for y in 0..rect_h {
        for x in 0..rect_w {
            if !inside_rounded_rect(x as f32 + 0.5, y as f32 + 0.5, rect_w as f32, rect_h as f32, r)
            {
                continue;
            }
            let idx = (((y + pad) as usize) * (width as usize) + (x + pad) as usize) * 4;
            mask[idx..idx + 4].copy_from_slice(&color);
        }
    }

    // canvas shadowBlur maps to a gaussian with sigma = blur / 2
    let sigma = (blur_px as f32 / 2.0).max(0.5);
    let rgba8_premul = blur_rgba8_premul(&mask, width, height, blur_px, sigma)?;
    Ok(GlowSprite {
        width,
        height,
        pad,
        rgba8_premul,
    })
}

fn inside_rounded_rect(px: f32, py: f32, w: f32, h: f32, r: f32) -> bool {
    let cx = px.clamp(r, w - r);
    let cy = py.clamp(r, h - r);
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= r * r
}

pub(crate) fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> ReelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ReelError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    blur_pass(src, &mut tmp, width, height, &kernel, Axis::Horizontal);
    blur_pass(&tmp, &mut out, width, height, &kernel, Axis::Vertical);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ReelResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ReelError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push rounding error into the center tap so the kernel sums to exactly 1.0 in Q16.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/glow.rs"]
mod tests;
