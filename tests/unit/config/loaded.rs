use super::*;

#[test]
fn nadirs_are_raster_files_only() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.png"), "x").unwrap();
    std::fs::write(dir.path().join("a.JPG"), "x").unwrap();
    std::fs::write(dir.path().join("readme.txt"), "x").unwrap();
    std::fs::create_dir(dir.path().join("sub.png")).unwrap();

    let found = list_nadirs(dir.path()).unwrap();
    assert_eq!(found, vec![dir.path().join("a.JPG"), dir.path().join("b.png")]);
    assert!(list_nadirs(&dir.path().join("missing")).unwrap().is_empty());
}

#[test]
fn assemble_carries_config_and_tokens() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("logo.png"), "x").unwrap();
    let config = AppConfig {
        root_dir: dir.path().join("ws"),
        nadir_dir: Some(dir.path().to_path_buf()),
        cameras: vec![CameraProfile {
            name: "cam".to_string(),
            description: None,
        }],
        ..AppConfig::default()
    };
    let tokens = BTreeMap::from([("mapillary".to_string(), "t".to_string())]);
    let loaded = LoadedConfig::assemble(&config, tokens.clone()).unwrap();
    assert_eq!(loaded.nadirs, vec![dir.path().join("logo.png")]);
    assert_eq!(loaded.basepath, dir.path().join("ws"));
    assert_eq!(loaded.tokens, tokens);
    assert_eq!(loaded.cameras.len(), 1);
}
