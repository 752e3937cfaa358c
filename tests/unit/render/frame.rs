use super::*;

fn half_canvas() -> Canvas {
    Canvas::new(540, 960).unwrap()
}

fn renderer() -> Option<FrameRenderer> {
    let Ok(font) = CaptionFont::from_system() else {
        eprintln!("skipping: no system font available");
        return None;
    };
    Some(FrameRenderer::new(half_canvas(), &font).unwrap())
}

fn solid_image(w: u32, h: u32, rgba: [u8; 4]) -> SourceImage {
    SourceImage::from_premul_rgba8(w, h, rgba.repeat((w * h) as usize)).unwrap()
}

#[test]
fn loop_progress_wraps_at_duration() {
    assert_eq!(loop_progress(0, 12_000), 0.0);
    assert_eq!(loop_progress(6_000, 12_000), 0.5);
    assert_eq!(loop_progress(12_000, 12_000), 0.0);
    assert_eq!(loop_progress(500, 0), 0.0);
}

#[test]
fn ken_burns_always_covers_the_canvas() {
    let canvas = Canvas::VERTICAL_HD;
    let style = FrameStyle::default();
    for (iw, ih) in [(4000, 3000), (600, 2000), (1080, 1920), (50, 50)] {
        for step in 0..20 {
            let t = f64::from(step) / 20.0;
            let tr = ken_burns_transform(canvas, iw, ih, t, &style);
            let top_left = tr * kurbo::Point::new(0.0, 0.0);
            let bottom_right = tr * kurbo::Point::new(f64::from(iw), f64::from(ih));
            assert!(top_left.x <= 0.0 && top_left.y <= 0.0, "{iw}x{ih} t={t}");
            assert!(
                bottom_right.x >= canvas.width_f64() && bottom_right.y >= canvas.height_f64(),
                "{iw}x{ih} t={t}"
            );
        }
    }
}

#[test]
fn ken_burns_zoom_grows_with_progress() {
    let canvas = Canvas::VERTICAL_HD;
    let style = FrameStyle::default();
    let scale_at = |t: f64| ken_burns_transform(canvas, 1000, 1000, t, &style).as_coeffs()[0];
    assert!(scale_at(0.0) < scale_at(0.5));
    assert!(scale_at(0.5) < scale_at(0.99));
    assert!((scale_at(0.0) - 1.92 * 1.05).abs() < 1e-9);
}

#[test]
fn background_only_frame_is_near_black() {
    let Some(mut r) = renderer() else { return };
    let frame = r
        .render_to_frame(None, 0, &CaptionSchedule::empty(12_000))
        .unwrap();
    assert_eq!(frame.width, 540);
    assert_eq!(frame.height, 960);
    assert_eq!(frame.pixel(270, 480), Some([10, 10, 10, 255]));
    assert_eq!(frame.pixel(0, 959), Some([10, 10, 10, 255]));
}

#[test]
fn photo_is_drawn_and_vignetted() {
    let Some(mut r) = renderer() else { return };
    let img = solid_image(64, 64, [200, 40, 40, 255]);
    let frame = r
        .render_to_frame(Some(&img), 1_000, &CaptionSchedule::empty(12_000))
        .unwrap();

    let center = frame.pixel(270, 480).unwrap();
    assert!(center[0] > 180, "center {center:?}");
    assert!(center[1] < 60, "center {center:?}");

    let corner = frame.pixel(1, 1).unwrap();
    assert!(corner[0] < center[0], "corner {corner:?} center {center:?}");
}

#[test]
fn active_caption_adds_text_and_button() {
    let Some(mut r) = renderer() else { return };
    let schedule = CaptionSchedule::for_topic("Fitness tips", 12_000).unwrap();
    let blank = CaptionSchedule::empty(12_000);

    let with = r.render_to_frame(None, 100, &schedule).unwrap();
    let without = r.render_to_frame(None, 100, &blank).unwrap();

    let band = |f: &FrameRGBA| {
        let mut bright = 0usize;
        for y in 480..600 {
            for x in 0..540 {
                let px = f.pixel(x, y).unwrap();
                if px[0] > 200 && px[1] > 200 && px[2] > 200 {
                    bright += 1;
                }
            }
        }
        bright
    };
    assert!(band(&with) > 50, "caption text should light up the caption band");
    assert_eq!(band(&without), 0);

    // button body sits 120px above the bottom edge
    let btn = with.pixel(130, 960 - 120 + 10).unwrap();
    assert!(btn[0] > 150 && btn[1] < 120, "button {btn:?}");
    assert_eq!(without.pixel(130, 960 - 120 + 10), Some([10, 10, 10, 255]));
}

#[test]
fn no_caption_at_exact_duration() {
    let Some(mut r) = renderer() else { return };
    let schedule = CaptionSchedule::for_topic("", 12_000).unwrap();
    let end = r.render_to_frame(None, 12_000, &schedule).unwrap();
    let plain = r
        .render_to_frame(None, 12_000, &CaptionSchedule::empty(12_000))
        .unwrap();
    assert_eq!(end.data, plain.data);
}

#[test]
fn mismatched_surface_is_rejected() {
    let Some(mut r) = renderer() else { return };
    let mut surface = Surface::new(Canvas::new(100, 100).unwrap()).unwrap();
    let err = r
        .render_frame(&mut surface, None, 0, &CaptionSchedule::empty(1))
        .unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
}

#[test]
fn replacing_a_same_size_image_redraws_the_new_pixels() {
    let Some(mut r) = renderer() else { return };
    let blank = CaptionSchedule::empty(12_000);

    let red = solid_image(64, 64, [220, 20, 20, 255]);
    let first = r.render_to_frame(Some(&red), 0, &blank).unwrap();
    assert!(first.pixel(270, 480).unwrap()[0] > 180);
    drop(red);

    for _ in 0..4 {
        let blue = solid_image(64, 64, [20, 20, 220, 255]);
        let frame = r.render_to_frame(Some(&blue), 0, &blank).unwrap();
        let center = frame.pixel(270, 480).unwrap();
        assert!(center[2] > 180 && center[0] < 60, "center {center:?}");
    }
}
