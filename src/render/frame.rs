use std::f64::consts::PI;
use std::sync::Arc;

use crate::assets::decode::SourceImage;
use crate::assets::font::CaptionFont;
use crate::captions::schedule::{Caption, CaptionSchedule};
use crate::foundation::core::{Affine, Canvas, Rgba8Premul, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::glow::glow_sprite;
use crate::render::paint::{
    affine_to_cpu, color, premul_image, rounded_rect_path, vignette_rgba8,
};
use crate::render::surface::{FrameRGBA, Surface, canvas_dims_u16};
use crate::render::text::{ShapedText, TextLayoutEngine};

/// Unit directions used to fake a stroke by stamping the glyphs around their origin.
const OUTLINE_DIRS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.707, 0.707),
    (-0.707, 0.707),
    (0.707, -0.707),
    (-0.707, -0.707),
];

/// Visual recipe of the reel template.
///
/// Colors are straight-alpha RGBA8. Offsets are in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStyle {
    /// Canvas fill behind everything.
    pub background: [u8; 4],

    /// Zoom at the start of the loop; grows by `zoom_growth` over one loop.
    pub zoom_start: f64,
    /// Zoom added over one loop.
    pub zoom_growth: f64,
    /// Pan amplitude as a fraction of the overflow on each axis.
    pub pan_x: f64,
    /// Vertical pan amplitude, as a fraction of the vertical overflow.
    pub pan_y: f64,
    /// Opacity of the photo layer.
    pub image_opacity: f32,
    /// Darkness of the vignette at its outer radius.
    pub vignette_alpha: f64,

    /// Caption font size.
    pub caption_size_px: f32,
    /// Caption baseline distance from the bottom edge.
    pub caption_bottom_px: f64,
    /// Height of the caption bob over one caption.
    pub caption_bob_px: f64,
    /// Horizontal margin the caption wraps inside.
    pub caption_margin_px: f64,
    /// Caption text color.
    pub caption_fill: [u8; 4],
    /// Outline offset around each glyph.
    pub caption_outline_px: f64,
    /// Outline opacity.
    pub caption_outline_alpha: f32,

    /// Hashtag line under the caption.
    pub tag_line: String,
    /// Hashtag font size.
    pub tag_size_px: f32,
    /// Distance from the last caption baseline to the hashtag baseline.
    pub tag_gap_px: f64,
    /// Hashtag color.
    pub tag_fill: [u8; 4],

    /// Call-to-action button label.
    pub cta_label: String,
    /// Button label font size.
    pub cta_size_px: f32,
    /// Button width.
    pub cta_width: u32,
    /// Button height.
    pub cta_height: u32,
    /// Top edge of the button, measured from the bottom edge.
    pub cta_bottom_px: f64,
    /// Button corner radius.
    pub cta_radius: f64,
    /// Button color.
    pub cta_fill: [u8; 4],
    /// Glow color behind the button.
    pub cta_glow: [u8; 4],
    /// Glow blur radius.
    pub cta_glow_blur_px: u32,
    /// Button label color.
    pub cta_label_fill: [u8; 4],
    /// Label baseline below the button top.
    pub cta_label_baseline_px: f64,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            background: [10, 10, 10, 255],

            zoom_start: 1.05,
            zoom_growth: 0.15,
            pan_x: 0.1,
            pan_y: 0.08,
            image_opacity: 0.95,
            vignette_alpha: 0.45,

            caption_size_px: 56.0,
            caption_bottom_px: 420.0,
            caption_bob_px: 8.0,
            caption_margin_px: 60.0,
            caption_fill: [255, 255, 255, 255],
            caption_outline_px: 5.0,
            caption_outline_alpha: 0.6,

            tag_line: "#fyp  #viral  #learn".to_string(),
            tag_size_px: 28.0,
            tag_gap_px: 48.0,
            tag_fill: [255, 255, 255, 230],

            cta_label: "Follow for daily tips".to_string(),
            cta_size_px: 28.0,
            cta_width: 420,
            cta_height: 64,
            cta_bottom_px: 120.0,
            cta_radius: 18.0,
            cta_fill: [236, 72, 153, 230],
            cta_glow: [236, 72, 153, 204],
            cta_glow_blur_px: 24,
            cta_label_fill: [255, 255, 255, 255],
            cta_label_baseline_px: 42.0,
        }
    }
}

/// Looping progress through the reel, in `[0, 1)`.
pub fn loop_progress(now_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (now_ms % duration_ms) as f64 / duration_ms as f64
}

/// Image-space to canvas-space transform for the slow zoom and drift.
///
/// Cover-fits the image, scales it by a zoom that grows with `t` and offsets it by one full
/// period of sinusoidal pan.
pub fn ken_burns_transform(
    canvas: Canvas,
    image_w: u32,
    image_h: u32,
    t: f64,
    style: &FrameStyle,
) -> Affine {
    let (w, h) = (canvas.width_f64(), canvas.height_f64());
    let (iw, ih) = (f64::from(image_w.max(1)), f64::from(image_h.max(1)));

    let zoom = style.zoom_start + style.zoom_growth * t;
    let scale = (w / iw).max(h / ih) * zoom;
    let (render_w, render_h) = (iw * scale, ih * scale);

    let pan_x = (t * PI * 2.0).sin() * style.pan_x * (render_w - w);
    let pan_y = (t * PI * 2.0).cos() * style.pan_y * (render_h - h);
    let x = (w - render_w) / 2.0 + pan_x;
    let y = (h - render_h) / 2.0 + pan_y;

    Affine::translate(Vec2::new(x, y)) * Affine::scale(scale)
}

struct ImagePaint {
    /// Held so the pixel buffer cannot be freed and its address reused while cached.
    source: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    paint: vello_cpu::Image,
}

impl ImagePaint {
    fn matches(&self, img: &SourceImage) -> bool {
        Arc::ptr_eq(&self.source, &img.rgba8_premul)
            && self.width == img.width
            && self.height == img.height
    }
}

struct GlowPaint {
    paint: vello_cpu::Image,
    width: u32,
    height: u32,
    pad: u32,
}

/// Draws reel frames: background, animated photo, vignette, active caption and call-to-action.
///
/// Holds the reusable raster context and caches (shaped text, vignette, glow, image paint), so
/// one renderer should live for the whole capture.
pub struct FrameRenderer {
    canvas: Canvas,
    style: FrameStyle,
    ctx: Option<vello_cpu::RenderContext>,
    text: TextLayoutEngine,
    vignette: Option<vello_cpu::Image>,
    glow: Option<GlowPaint>,
    image: Option<ImagePaint>,
}

impl FrameRenderer {
    /// Renderer with the default style.
    pub fn new(canvas: Canvas, font: &CaptionFont) -> ReelResult<Self> {
        Self::with_style(canvas, font, FrameStyle::default())
    }

    /// Renderer with a custom style.
    pub fn with_style(canvas: Canvas, font: &CaptionFont, style: FrameStyle) -> ReelResult<Self> {
        canvas_dims_u16(canvas)?;
        Ok(Self {
            canvas,
            style,
            ctx: None,
            text: TextLayoutEngine::new(font)?,
            vignette: None,
            glow: None,
            image: None,
        })
    }

    /// Frame size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Active style.
    pub fn style(&self) -> &FrameStyle {
        &self.style
    }

    /// Draw the frame at `now_ms` into `surface`.
    ///
    /// The zoom/pan loop length is the schedule's duration. Without an image only the
    /// background and caption layers are drawn.
    pub fn render_frame(
        &mut self,
        surface: &mut Surface,
        image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<()> {
        if surface.canvas() != self.canvas {
            return Err(ReelError::render(format!(
                "surface is {}x{}, renderer expects {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }

        let (w, h) = canvas_dims_u16(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();

        let out = self.draw(&mut ctx, image, now_ms, schedule);
        if out.is_ok() {
            ctx.flush();
            ctx.render_to_pixmap(surface.pixmap_mut());
        }
        self.ctx = Some(ctx);
        out
    }

    /// Render into a fresh surface and return the pixels.
    pub fn render_to_frame(
        &mut self,
        image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<FrameRGBA> {
        let mut surface = Surface::new(self.canvas)?;
        self.render_frame(&mut surface, image, now_ms, schedule)?;
        Ok(surface.to_frame())
    }

    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<()> {
        let (w, h) = (self.canvas.width_f64(), self.canvas.height_f64());

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color(self.style.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        if let Some(img) = image {
            let t = loop_progress(now_ms, schedule.duration_ms());
            self.draw_photo(ctx, img, t)?;
            self.draw_vignette(ctx)?;
        }

        if let Some(cap) = schedule.active_at(now_ms) {
            self.draw_caption(ctx, cap, now_ms)?;
            self.draw_cta(ctx)?;
        }

        Ok(())
    }

    fn draw_photo(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        img: &SourceImage,
        t: f64,
    ) -> ReelResult<()> {
        let paint = match &self.image {
            Some(p) if p.matches(img) => p.paint.clone(),
            _ => {
                let paint = premul_image(&img.rgba8_premul, img.width, img.height)?;
                self.image = Some(ImagePaint {
                    source: img.rgba8_premul.clone(),
                    width: img.width,
                    height: img.height,
                    paint: paint.clone(),
                });
                paint
            }
        };

        let tr = ken_burns_transform(self.canvas, img.width, img.height, t, &self.style);
        ctx.set_transform(affine_to_cpu(tr));
        ctx.set_paint(paint);
        let opacity = self.style.image_opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    fn draw_vignette(&mut self, ctx: &mut vello_cpu::RenderContext) -> ReelResult<()> {
        let (w, h) = (self.canvas.width_f64(), self.canvas.height_f64());
        if self.vignette.is_none() {
            let bytes = vignette_rgba8(
                self.canvas,
                w.min(h) / 3.0,
                w.max(h),
                self.style.vignette_alpha,
            );
            self.vignette = Some(premul_image(&bytes, self.canvas.width, self.canvas.height)?);
        }
        let Some(vignette) = self.vignette.clone() else {
            return Ok(());
        };

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vignette);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        Ok(())
    }

    fn draw_caption(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        cap: &Caption,
        now_ms: u64,
    ) -> ReelResult<()> {
        let (w, h) = (self.canvas.width_f64(), self.canvas.height_f64());
        let max_width = (w - 2.0 * self.style.caption_margin_px).max(1.0) as f32;

        let rel = cap.progress_at(now_ms);
        let baseline = h - self.style.caption_bottom_px - (rel * PI).sin() * self.style.caption_bob_px;

        let caption = self
            .text
            .shape(&cap.text, self.style.caption_size_px, max_width)?;
        let outline = Outline {
            radius_px: self.style.caption_outline_px,
            alpha: self.style.caption_outline_alpha,
        };
        self.draw_text(
            ctx,
            &caption,
            w / 2.0,
            baseline,
            self.style.caption_fill,
            Some(outline),
        );

        let tag_line = self.style.tag_line.clone();
        let tag = self.text.shape(&tag_line, self.style.tag_size_px, max_width)?;
        let caption_last_line =
            baseline + f64::from(caption.last_baseline() - caption.first_baseline());
        self.draw_text(
            ctx,
            &tag,
            w / 2.0,
            caption_last_line + self.style.tag_gap_px,
            self.style.tag_fill,
            None,
        );
        Ok(())
    }

    fn draw_cta(&mut self, ctx: &mut vello_cpu::RenderContext) -> ReelResult<()> {
        let (w, h) = (self.canvas.width_f64(), self.canvas.height_f64());
        let btn_w = f64::from(self.style.cta_width);
        let btn_h = f64::from(self.style.cta_height);
        let btn_x = (w - btn_w) / 2.0;
        let btn_y = h - self.style.cta_bottom_px;

        if self.glow.is_none() {
            let [r, g, b, a] = self.style.cta_glow;
            let sprite = glow_sprite(
                self.style.cta_width,
                self.style.cta_height,
                self.style.cta_radius as f32,
                self.style.cta_glow_blur_px,
                Rgba8Premul::from_straight_rgba(r, g, b, a).to_array(),
            )?;
            self.glow = Some(GlowPaint {
                paint: premul_image(&sprite.rgba8_premul, sprite.width, sprite.height)?,
                width: sprite.width,
                height: sprite.height,
                pad: sprite.pad,
            });
        }
        if let Some(glow) = &self.glow {
            let pad = f64::from(glow.pad);
            ctx.set_transform(affine_to_cpu(Affine::translate(Vec2::new(
                btn_x - pad,
                btn_y - pad,
            ))));
            ctx.set_paint(glow.paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(glow.width),
                f64::from(glow.height),
            ));
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color(self.style.cta_fill));
        ctx.fill_path(&rounded_rect_path(
            btn_x,
            btn_y,
            btn_w,
            btn_h,
            self.style.cta_radius,
        ));

        let label_text = self.style.cta_label.clone();
        let label = self
            .text
            .shape(&label_text, self.style.cta_size_px, self.style.cta_width as f32)?;
        self.draw_text(
            ctx,
            &label,
            w / 2.0,
            btn_y + self.style.cta_label_baseline_px,
            self.style.cta_label_fill,
            None,
        );
        Ok(())
    }

    /// Draw `shaped` centered on `center_x`, with its first baseline at `baseline_y`.
    fn draw_text(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        shaped: &ShapedText,
        center_x: f64,
        baseline_y: f64,
        fill: [u8; 4],
        outline: Option<Outline>,
    ) {
        let top = baseline_y - f64::from(shaped.first_baseline());
        let font = self.text.font_data();
        let line_origin =
            |width: f32| -> f64 { center_x - f64::from(width) / 2.0 };

        if let Some(outline) = outline {
            ctx.push_opacity_layer(outline.alpha.clamp(0.0, 1.0));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
            for line in &shaped.lines {
                let x0 = line_origin(line.width);
                for (dx, dy) in OUTLINE_DIRS {
                    ctx.set_transform(affine_to_cpu(Affine::translate(Vec2::new(
                        x0 + dx * outline.radius_px,
                        top + dy * outline.radius_px,
                    ))));
                    ctx.glyph_run(font)
                        .font_size(shaped.font_size)
                        .fill_glyphs(line.glyphs.iter().copied());
                }
            }
            ctx.pop_layer();
        }

        ctx.set_paint(color(fill));
        for line in &shaped.lines {
            ctx.set_transform(affine_to_cpu(Affine::translate(Vec2::new(
                line_origin(line.width),
                top,
            ))));
            ctx.glyph_run(font)
                .font_size(shaped.font_size)
                .fill_glyphs(line.glyphs.iter().copied());
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

/// Anything that can paint a reel frame onto a [`Surface`].
///
/// The capture loop drives this seam; [`FrameRenderer`] is the production implementation.
pub trait FramePainter {
    /// Size of the frames this painter draws.
    fn canvas(&self) -> Canvas;

    /// Opaque color used to flatten translucent pixels at encode time.
    fn background(&self) -> [u8; 4];

    /// Draw the frame at `now_ms` into `surface`.
    fn paint(
        &mut self,
        surface: &mut Surface,
        image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<()>;
}

impl FramePainter for FrameRenderer {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn background(&self) -> [u8; 4] {
        self.style.background
    }

    fn paint(
        &mut self,
        surface: &mut Surface,
        image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<()> {
        self.render_frame(surface, image, now_ms, schedule)
    }
}

#[derive(Clone, Copy, Debug)]
struct Outline {
    radius_px: f64,
    alpha: f32,
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
