use super::*;

#[test]
fn sequence_names_cannot_escape_their_directory() {
    for bad in ["", "   ", ".hidden", "a/b", "a\\b", "c:d", "tab\there"] {
        let err = validate_sequence_name(bad).unwrap_err();
        assert_eq!(err.kind(), "validation", "{bad:?}");
    }
    validate_sequence_name("Morning ride 2021-05-01").unwrap();
}

#[test]
fn nadir_fraction_is_validated_with_the_config() {
    let mut config = SequenceConfig::named("ride");
    config.nadir = Some(NadirStep {
        logo_file: PathBuf::from("logo.png"),
        height_fraction: 1.5,
    });
    assert_eq!(config.validate().unwrap_err().kind(), "validation");
}

#[test]
fn destination_serializes_with_type_tag() {
    let d = Destination {
        kind: DestinationKind::Mapillary,
        external_sequence_id: None,
    };
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v, serde_json::json!({ "type": "mapillary" }));
    assert_eq!(DestinationKind::Mapillary.credential_key(), Some("mapillary"));
    assert_eq!(DestinationKind::Local.credential_key(), None);
}

#[test]
fn config_json_defaults_optional_fields() {
    let c: SequenceConfig = serde_json::from_str(r#"{ "name": "x" }"#).unwrap();
    assert_eq!(c, SequenceConfig::named("x"));
}
