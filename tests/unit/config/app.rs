use super::*;

#[test]
fn empty_object_is_all_defaults() {
    let c = AppConfig::from_json_str("{}").unwrap();
    assert_eq!(c, AppConfig::default());
    assert_eq!(c.preview.fractions().len(), 16);
    assert_eq!(c.video_frame_interval_sec, 1.0);
}

#[test]
fn parses_cameras_and_integrations() {
    let c = AppConfig::from_json_str(
        r#"{
            "root_dir": "/srv/geo",
            "cameras": [{ "name": "GoPro Max" }],
            "integrations": [
                { "name": "mapillary", "type": "mapillary", "mapillary": { "client_id": "abc" } }
            ],
            "preview": { "start_percent": 5, "step_percent": 5, "count": 4 },
            "threads": 2
        }"#,
    )
    .unwrap();
    assert_eq!(c.cameras[0].name, "GoPro Max");
    let i = c.integration(DestinationKind::Mapillary).unwrap();
    assert_eq!(i.mapillary.client_id, "abc");
    assert_eq!(i.mapillary.timeout_secs, 30);
    assert!(c.integration(DestinationKind::Local).is_none());
    assert_eq!(c.threading().threads, Some(2));
    assert_eq!(c.layout().manifest_path(), Path::new("/srv/geo/sequences/manifest.json"));
}

#[test]
fn invalid_values_are_rejected() {
    for bad in [
        r#"{ "threads": 0 }"#,
        r#"{ "video_frame_interval_sec": 0 }"#,
        r#"{ "capture_utc_offset_minutes": 900 }"#,
        r#"{ "preview": { "count": 0 } }"#,
        r#"{ "preview": { "start_percent": 90, "step_percent": 5, "count": 4 } }"#,
        r#"{ "root_dir": "" }"#,
        r#"{ "integrations": [
            { "name": "m", "type": "mapillary" },
            { "name": "m", "type": "mapillary" }
        ] }"#,
        "not json",
    ] {
        let err = AppConfig::from_json_str(bad).unwrap_err();
        assert_eq!(err.kind(), "validation", "{bad}");
    }
}

#[test]
fn load_resolves_relative_dirs_against_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geoseq.json");
    std::fs::write(&path, r#"{ "root_dir": "data", "nadir_dir": "logos" }"#).unwrap();
    let c = AppConfig::load(&path).unwrap();
    assert_eq!(c.root_dir, dir.path().join("data"));
    assert_eq!(c.nadir_dir, Some(dir.path().join("logos")));

    let missing = AppConfig::load(&dir.path().join("nope.json")).unwrap_err();
    assert_eq!(missing.kind(), "validation");
}

#[test]
fn capture_offset_defaults_to_utc_and_accepts_local_clocks() {
    assert_eq!(AppConfig::from_json_str("{}").unwrap().capture_utc_offset_minutes, 0);
    let c = AppConfig::from_json_str(r#"{ "capture_utc_offset_minutes": -330 }"#).unwrap();
    assert_eq!(c.capture_utc_offset_minutes, -330);
}
