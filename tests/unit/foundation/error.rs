use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(GeoseqError::ingest("x").to_string().contains("ingest error:"));
    assert!(
        GeoseqError::track_parse("x")
            .to_string()
            .contains("track parse error:")
    );
    assert!(
        GeoseqError::composite("x")
            .to_string()
            .contains("composite error:")
    );
    assert!(
        GeoseqError::manifest_io("x")
            .to_string()
            .contains("manifest io error:")
    );
    assert!(
        GeoseqError::external("x")
            .to_string()
            .contains("external service error:")
    );
}

#[test]
fn missing_geotag_names_the_photo() {
    let err = GeoseqError::missing_geotag("seq/original/0001.jpg");
    assert!(err.to_string().contains("seq/original/0001.jpg"));
    assert_eq!(err.kind(), "missing_geotag");
}

#[test]
fn kinds_are_distinct() {
    let kinds = [
        GeoseqError::ingest("x").kind(),
        GeoseqError::track_parse("x").kind(),
        GeoseqError::EmptyTrack.kind(),
        GeoseqError::missing_geotag("x").kind(),
        GeoseqError::composite("x").kind(),
        GeoseqError::manifest_io("x").kind(),
        GeoseqError::external("x").kind(),
        GeoseqError::validation("x").kind(),
        GeoseqError::cancelled("x").kind(),
    ];
    let unique: std::collections::BTreeSet<_> = kinds.iter().collect();
    assert_eq!(unique.len(), kinds.len());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GeoseqError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), "other");
}
