use super::*;
use crate::foundation::core::{Canvas, Fps};

fn cfg(w: u32, h: u32) -> EncoderConfig {
    EncoderConfig::new(Canvas::new(w, h).unwrap(), Fps::new(10).unwrap(), Container::Webm)
}

#[test]
fn container_media_types() {
    assert_eq!(Container::default(), Container::Webm);
    assert_eq!(Container::Webm.media_type(), "video/webm");
    assert_eq!(Container::Mp4.media_type(), "video/mp4");
    assert_eq!(Container::Mp4.extension(), "mp4");
}

#[test]
fn container_serde_is_snake_case() {
    let s = serde_json::to_string(&Container::Mp4).unwrap();
    assert_eq!(s, "\"mp4\"");
    let c: Container = serde_json::from_str("\"webm\"").unwrap();
    assert_eq!(c, Container::Webm);
}

#[test]
fn artifact_file_name_follows_media_type() {
    let a = VideoArtifact {
        bytes: vec![1, 2, 3],
        media_type: "video/webm".to_string(),
        frame_count: 1,
    };
    assert_eq!(a.suggested_file_name(), "video.webm");
    assert_eq!(a.len(), 3);
    assert!(!a.is_empty());
}

#[test]
fn in_memory_records_frames_in_order() {
    let mut enc = InMemoryEncoder::new();
    let surface = Surface::new(Canvas::new(4, 2).unwrap()).unwrap();
    enc.begin(&cfg(4, 2)).unwrap();
    enc.push_frame(0, &surface).unwrap();
    enc.push_frame(100, &surface).unwrap();
    assert!(enc.push_frame(100, &surface).is_err());
    assert_eq!(enc.timestamps(), &[0, 100]);

    let artifact = enc.finish().unwrap();
    assert_eq!(artifact.frame_count, 2);
    assert_eq!(artifact.bytes.len(), 2 * 4 * 2 * 4);
    assert_eq!(artifact.media_type, RAW_MEDIA_TYPE);
    assert!(!enc.is_active());
}

#[test]
fn in_memory_rejects_misuse() {
    let mut enc = InMemoryEncoder::new();
    let surface = Surface::new(Canvas::new(4, 2).unwrap()).unwrap();
    assert!(enc.push_frame(0, &surface).is_err());
    assert!(enc.finish().is_err());

    enc.begin(&cfg(4, 2)).unwrap();
    assert!(enc.begin(&cfg(4, 2)).is_err());

    let other = Surface::new(Canvas::new(2, 2).unwrap()).unwrap();
    assert!(matches!(
        enc.push_frame(0, &other),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn in_memory_abort_discards_and_allows_restart() {
    let mut enc = InMemoryEncoder::new();
    let surface = Surface::new(Canvas::new(2, 2).unwrap()).unwrap();
    enc.begin(&cfg(2, 2)).unwrap();
    enc.push_frame(5, &surface).unwrap();
    enc.abort();
    assert_eq!(enc.abort_count(), 1);
    assert!(enc.frames().is_empty());

    // abort without an active run is a no-op
    enc.abort();
    assert_eq!(enc.abort_count(), 1);

    enc.begin(&cfg(2, 2)).unwrap();
    assert_eq!(enc.begin_count(), 2);
    enc.push_frame(0, &surface).unwrap();
    assert_eq!(enc.finish().unwrap().frame_count, 1);
}

#[test]
fn late_frames_repeat_the_previous_one_and_pad_to_duration() {
    let mut enc = InMemoryEncoder::new();
    let mut surface = Surface::new(Canvas::new(2, 2).unwrap()).unwrap();
    enc.begin(&cfg(2, 2).with_duration_ms(500)).unwrap();

    enc.push_frame(0, &surface).unwrap();
    surface.pixmap_mut().data_as_u8_slice_mut().fill(255);
    enc.push_frame(300, &surface).unwrap();
    assert_eq!(enc.output_slots(), &[0, 0, 0, 1]);

    let artifact = enc.finish().unwrap();
    assert_eq!(artifact.frame_count, 5);
    assert_eq!(enc.output_slots(), &[0, 0, 0, 1, 1]);
    let frame_len = 2 * 2 * 4;
    assert_eq!(artifact.bytes.len(), 5 * frame_len);
    assert!(artifact.bytes[..3 * frame_len].iter().all(|&b| b == 0));
    assert!(artifact.bytes[3 * frame_len..].iter().all(|&b| b == 255));
}

#[test]
fn late_first_frame_covers_the_leading_slots() {
    let mut enc = InMemoryEncoder::new();
    let surface = Surface::new(Canvas::new(2, 2).unwrap()).unwrap();
    enc.begin(&cfg(2, 2)).unwrap();
    enc.push_frame(200, &surface).unwrap();
    assert_eq!(enc.output_slots(), &[0, 0, 0]);

    // open-ended runs are not padded
    assert_eq!(enc.finish().unwrap().frame_count, 3);
}

#[test]
fn frames_sharing_a_slot_or_past_the_end_are_dropped() {
    let mut enc = InMemoryEncoder::new();
    let surface = Surface::new(Canvas::new(2, 2).unwrap()).unwrap();
    enc.begin(&cfg(2, 2).with_duration_ms(300)).unwrap();

    enc.push_frame(0, &surface).unwrap();
    enc.push_frame(20, &surface).unwrap();
    assert_eq!(enc.output_slots(), &[0]);

    enc.push_frame(900, &surface).unwrap();
    enc.push_frame(1_500, &surface).unwrap();
    assert_eq!(enc.output_slots(), &[0, 1, 2]);
    assert_eq!(enc.timestamps(), &[0, 20, 900, 1_500]);
    assert_eq!(enc.finish().unwrap().frame_count, 3);
}

#[test]
fn timeline_rounds_fixed_steps_onto_consecutive_slots() {
    let fps = Fps::new(30).unwrap();
    let mut timeline = FrameTimeline::new(&EncoderConfig::new(
        Canvas::new(2, 2).unwrap(),
        fps,
        Container::Webm,
    )
    .with_duration_ms(1_000));
    for tick in 0..30 {
        let fill = timeline.place(fps.tick_to_ms(tick));
        assert_eq!(
            fill,
            SlotFill {
                repeat_previous: 0,
                incoming: 1
            },
            "tick {tick}"
        );
    }
    assert_eq!(timeline.pad(), 0);
    assert_eq!(timeline.written(), 30);
}

#[test]
fn artifact_write_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("photoreel-artifact-{}", std::process::id()));
    let path = dir.join("nested").join("video.webm");
    let a = VideoArtifact {
        bytes: b"webm".to_vec(),
        media_type: "video/webm".to_string(),
        frame_count: 1,
    };
    a.write_to(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"webm");
    let _ = std::fs::remove_dir_all(&dir);
}
