use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use chrono::{TimeZone, Utc};

use super::*;
use crate::{destination::service::SequenceStatus, sequence::model::Photo};

struct FixedSession {
    calls: AtomicUsize,
}

impl DestinationService for FixedSession {
    fn resolve_session(&self, credential: &str) -> GeoseqResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(credential, "secret");
        Ok(Session {
            key: "upload-42".to_string(),
        })
    }

    fn check_sequence_status(
        &self,
        _credential: &str,
        _external_sequence_id: &str,
        _photos: &BTreeMap<String, Photo>,
    ) -> GeoseqResult<SequenceStatus> {
        Ok(SequenceStatus { linked: true })
    }
}

fn workspace() -> (tempfile::TempDir, Workspace) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        root_dir: dir.path().join("ws"),
        ..AppConfig::default()
    };
    let ws = Workspace::open(config).unwrap();
    (dir, ws)
}

fn geotagged(ws: &Workspace, name: &str) -> Vec<CapturePoint> {
    let dir = ws.layout().originals_dir(name);
    std::fs::create_dir_all(&dir).unwrap();
    (0..2)
        .map(|i| {
            let path = dir.join(format!("{i}.png"));
            image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]))
                .save(&path)
                .unwrap();
            CapturePoint {
                file_path: path,
                width: 8,
                height: 8,
                captured_at: Utc.timestamp_opt(1_600_000_000 + i, 0).unwrap(),
                native_latitude: Some(45.0 + i as f64 * 0.001),
                native_longitude: Some(7.0),
                native_altitude: Some(300.0),
            }
        })
        .collect()
}

#[test]
fn commit_writes_manifest_and_sidecar() {
    let (_dir, ws) = workspace();
    let points = geotagged(&ws, "ride");
    let summary = ws
        .commit_sequence(&SequenceConfig::named("ride"), &points)
        .unwrap();
    assert_eq!(summary.photo_count, 2);
    assert_eq!(summary.destination, DestinationStatus::Local);
    assert!(ws.layout().sidecar_path("ride").is_file());
    assert!(ws.store().get(&summary.id).unwrap().is_some());
}

#[test]
fn committed_names_cannot_be_reused() {
    let (_dir, ws) = workspace();
    let points = geotagged(&ws, "ride");
    ws.commit_sequence(&SequenceConfig::named("ride"), &points)
        .unwrap();

    let err = ws
        .ingest(ws.layout().root(), "ride", IngestMode::Images, false)
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    let err = ws
        .commit_sequence(&SequenceConfig::named("ride"), &points)
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    // the committed originals survive
    assert!(points.iter().all(|p| p.file_path.is_file()));
}

#[test]
fn concurrent_commits_of_one_name_admit_a_single_winner() {
    let (_dir, ws) = workspace();
    let points = geotagged(&ws, "ride");
    let config = SequenceConfig::named("ride");

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| ws.commit_sequence(&config, &points)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    for err in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), "validation");
    }
    assert_eq!(ws.store().entries().unwrap().len(), 1);
    assert!(ws.layout().sidecar_path("ride").is_file());
}

#[test]
fn ingest_refuses_a_name_held_by_another_operation() {
    let (dir, ws) = workspace();
    let held = ws.reserve_name("ride").unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    let err = ws
        .ingest(&src, "ride", IngestMode::Images, false)
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(err.to_string().contains("already being ingested or committed"));
    drop(held);
    assert!(ws.reserve_name("ride").is_ok());
}

#[test]
fn mapillary_commit_needs_an_integration() {
    let (_dir, ws) = workspace();
    let points = geotagged(&ws, "ride");
    let mut config = SequenceConfig::named("ride");
    config.destination.kind = DestinationKind::Mapillary;
    let err = ws.commit_sequence(&config, &points).unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(ws.store().entries().unwrap().is_empty());
}

#[test]
fn mapillary_commit_resolves_a_session_with_the_stored_token() {
    let (_dir, ws) = workspace();
    let ws = ws.with_destination(Box::new(FixedSession {
        calls: AtomicUsize::new(0),
    }));
    let points = geotagged(&ws, "ride");
    let mut config = SequenceConfig::named("ride");
    config.destination.kind = DestinationKind::Mapillary;

    let err = ws.commit_sequence(&config, &points).unwrap_err();
    assert_eq!(err.kind(), "external_service");

    ws.set_token("mapillary", "secret").unwrap();
    let summary = ws.commit_sequence(&config, &points).unwrap();
    assert_eq!(
        summary.destination,
        DestinationStatus::Pending {
            key: "upload-42".to_string()
        }
    );
    let listed = ws.list_sequences().unwrap();
    assert_eq!(
        listed[0].destination,
        DestinationStatus::Linked {
            key: "upload-42".to_string()
        }
    );
}

#[test]
fn failed_ingest_leaves_no_sequence_directory() {
    let (dir, ws) = workspace();
    let src = dir.path().join("photos");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("notes.txt"), "x").unwrap();

    let err = ws.ingest(&src, "draft", IngestMode::Images, false).unwrap_err();
    assert_eq!(err.kind(), "ingest");
    assert!(!ws.layout().sequence_dir("draft").exists());
}

#[test]
fn shutdown_cancels_and_clears_scratch() {
    let (_dir, ws) = workspace();
    let before = ws.current_cancel();
    std::fs::write(ws.layout().scratch_dir().join("logo.png"), "x").unwrap();
    ws.shutdown(None).unwrap();
    assert!(before.is_cancelled());
    assert!(!ws.current_cancel().is_cancelled());
    assert_eq!(std::fs::read_dir(ws.layout().scratch_dir()).unwrap().count(), 0);
}

#[test]
fn load_config_reports_root_and_tokens() {
    let (_dir, ws) = workspace();
    ws.set_token("mapillary", "t").unwrap();
    let loaded = ws.load_config().unwrap();
    assert_eq!(loaded.basepath, ws.config().root_dir);
    assert_eq!(loaded.tokens.get("mapillary").map(String::as_str), Some("t"));
    assert!(loaded.nadirs.is_empty());
}
