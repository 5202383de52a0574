use std::fs;

use fedsplit::config::{self, ConfigError};
use fedsplit::models::enums::DatabaseType;

#[test]
fn loads_catalog_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"{"backends":[{"name":"lite","backend":"SQLite"}],"tables":[{"table":"t","backend":"lite"}],"default_backend":"lite"}"#,
    )
    .expect("write");

    let catalog = config::load_catalog(&path).expect("load");
    assert_eq!(catalog.backends[0].backend, DatabaseType::SQLite);
    assert_eq!(catalog.backends[0].port, None);
    assert_eq!(catalog.backend_for_table(&["T".to_string()]), Some("lite"));
    assert_eq!(catalog.backend_for_table(&["other".to_string()]), Some("lite"));
}

#[test]
fn malformed_catalog_is_a_json_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");
    fs::write(&path, r#"{"backends": [{"name": "x"}]"#).expect("write");
    assert!(matches!(config::load_catalog(&path), Err(ConfigError::Json { .. })));
}

#[test]
fn missing_catalog_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = config::load_catalog(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn data_dir_override_and_empty_default_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Only this test touches the variable.
    unsafe { std::env::set_var(config::DATA_DIR_ENV, dir.path()) };

    assert_eq!(config::get_data_dir(), dir.path());
    assert_eq!(config::default_catalog_path(), dir.path().join("catalog.json"));
    let empty = config::load_default_catalog().expect("absent file is fine");
    assert!(empty.backends.is_empty());
    assert_eq!(empty.backend_for_table(&["t".to_string()]), None);

    fs::write(dir.path().join("catalog.json"), r#"{"default_backend":"pg"}"#).expect("write");
    let catalog = config::load_default_catalog().expect("load");
    assert_eq!(catalog.default_backend.as_deref(), Some("pg"));

    unsafe { std::env::remove_var(config::DATA_DIR_ENV) };
}
