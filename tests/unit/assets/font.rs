use super::*;

#[test]
fn empty_font_bytes_are_rejected() {
    assert!(CaptionFont::from_bytes("x", Vec::new()).is_err());
}

#[test]
fn missing_font_file_reports_the_path() {
    let err = CaptionFont::resolve(&FontSource::File(PathBuf::from(
        "target/definitely-missing-font.ttf",
    )))
    .unwrap_err();
    assert!(format!("{err:#}").contains("definitely-missing-font.ttf"));
}

#[test]
fn sha256_is_lowercase_hex() {
    let f = CaptionFont::from_bytes("x", b"abc".to_vec()).unwrap();
    assert_eq!(
        f.sha256_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn font_source_round_trips_through_json() {
    let src: FontSource = serde_json::from_str(r#"{"file":"fonts/Bold.ttf"}"#).unwrap();
    assert_eq!(src, FontSource::File(PathBuf::from("fonts/Bold.ttf")));
    let sys: FontSource = serde_json::from_str(r#""system""#).unwrap();
    assert_eq!(sys, FontSource::System);
}
