use chrono::TimeZone;

use super::*;

#[test]
fn probe_json_extracts_geometry_and_creation_time() {
    let json = br#"{
        "streams": [
            {"codec_type": "audio"},
            {"codec_type": "video", "width": 1920, "height": 1080,
             "tags": {"creation_time": "2021-03-04T05:06:07.000000Z"}}
        ],
        "format": {"duration": "12.5"}
    }"#;
    let probe = parse_probe_json(json).unwrap();
    assert_eq!((probe.width, probe.height), (1920, 1080));
    assert_eq!(probe.duration_sec, 12.5);
    assert_eq!(
        probe.creation_time,
        Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
    );
}

#[test]
fn probe_json_prefers_container_creation_time() {
    let json = br#"{
        "streams": [{"codec_type": "video", "width": 2, "height": 2,
                     "tags": {"creation_time": "2000-01-01T00:00:00Z"}}],
        "format": {"tags": {"creation_time": "2022-02-02T02:02:02Z"}}
    }"#;
    let probe = parse_probe_json(json).unwrap();
    assert_eq!(
        probe.creation_time,
        Some(Utc.with_ymd_and_hms(2022, 2, 2, 2, 2, 2).unwrap())
    );
}

#[test]
fn probe_json_without_video_stream_is_ingest_error() {
    let err = parse_probe_json(br#"{"streams": [{"codec_type": "audio"}]}"#).unwrap_err();
    assert_eq!(err.kind(), "ingest");
    assert!(parse_probe_json(b"garbage").is_err());
}

#[test]
fn non_positive_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = ingest_video(Path::new("missing.mp4"), dir.path(), 0.0).unwrap_err();
    assert_eq!(err.kind(), "validation");
}
