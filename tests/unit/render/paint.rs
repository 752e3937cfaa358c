use super::*;

#[test]
fn vignette_is_clear_in_the_middle_and_dark_at_the_corners() {
    let canvas = Canvas::new(90, 160).unwrap();
    let v = vignette_rgba8(canvas, 30.0, 160.0, 0.45);
    let alpha = |x: usize, y: usize| v[(y * 90 + x) * 4 + 3];

    assert_eq!(alpha(45, 80), 0);
    let corner = alpha(0, 0);
    assert!(corner > 0 && corner <= 115, "corner alpha {corner}");
    assert!(alpha(0, 0) > alpha(20, 40));
    // rgb stays zero: premultiplied black
    assert!(v.chunks_exact(4).all(|px| px[0] == 0 && px[1] == 0 && px[2] == 0));
}

#[test]
fn pixmap_conversion_checks_length() {
    assert!(pixmap_from_premul_bytes(&[0u8; 16], 2, 2).is_ok());
    assert!(pixmap_from_premul_bytes(&[0u8; 12], 2, 2).is_err());
    assert!(pixmap_from_premul_bytes(&[], 70_000, 0).is_err());
}

#[test]
fn rounded_rect_path_is_closed_and_bounded() {
    use kurbo::Shape as _;
    let p = rounded_rect_path(10.0, 20.0, 100.0, 40.0, 8.0);
    let bb = p.bounding_box();
    assert!((bb.x0 - 10.0).abs() < 1e-6);
    assert!((bb.y1 - 60.0).abs() < 1e-6);
}
