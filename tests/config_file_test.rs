use muzero_core::{ConfigError, MuZeroConfig};
use tempfile::tempdir;

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("muzero.json");

    let config = MuZeroConfig {
        num_simulations: 100,
        support_size: 300,
        seed: Some(42),
        ..MuZeroConfig::default()
    };
    config.save_json_file(&path).unwrap();

    let loaded = MuZeroConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "gamma": 2.0 }"#).unwrap();

    assert!(matches!(
        MuZeroConfig::from_json_file(&path),
        Err(ConfigError::InvalidConfig { .. })
    ));
    assert!(matches!(
        MuZeroConfig::from_json_file(dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));
}
