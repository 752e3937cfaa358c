use super::*;

fn engine() -> Option<TextLayoutEngine> {
    let Ok(font) = CaptionFont::from_system() else {
        eprintln!("skipping: no system font available");
        return None;
    };
    Some(TextLayoutEngine::new(&font).unwrap())
}

#[test]
fn latin_glyphs_sit_on_the_line_baseline() {
    let Some(mut e) = engine() else { return };
    let shaped = e.shape("Hook: Fitness tips", 56.0, 960.0).unwrap();
    assert_eq!(shaped.lines.len(), 1);

    let line = &shaped.lines[0];
    assert!(line.baseline > 0.0);
    assert!(!line.glyphs.is_empty());
    for g in &line.glyphs {
        assert!((g.y - line.baseline).abs() < 0.5, "glyph y {} baseline {}", g.y, line.baseline);
    }
    assert!(line.glyphs.windows(2).all(|w| w[1].x > w[0].x));
    assert!(line.width > 0.0 && line.width <= 960.0);
}

#[test]
fn narrow_width_wraps_onto_lower_baselines() {
    let Some(mut e) = engine() else { return };
    let shaped = e
        .shape("Bonus: Ask a question to boost comments", 56.0, 300.0)
        .unwrap();
    assert!(shaped.lines.len() > 1);
    assert!(shaped.last_baseline() > shaped.first_baseline());
}

#[test]
fn shaping_is_cached_and_rejects_bad_sizes() {
    let Some(mut e) = engine() else { return };
    let a = e.shape("Follow for daily tips", 28.0, 420.0).unwrap();
    let b = e.shape("Follow for daily tips", 28.0, 420.0).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(e.shape("x", 0.0, 100.0).is_err());
    assert!(e.shape("x", f32::NAN, 100.0).is_err());
}
