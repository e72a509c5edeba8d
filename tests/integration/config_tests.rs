use clap::Parser;
use dupemirror::cli::{Cli, Commands};
use dupemirror::config::Config;
use dupemirror::fingerprint::Strategy;
use dupemirror::output::OutputFormat;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DUPEMIRROR_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPEMIRROR_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
extension = "png"
strategy = "dhash"
index = "/var/lib/dupemirror/index.db"
output = "json"
follow_symlinks = true
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.extension, "png");
    assert_eq!(config.strategy, Strategy::Dhash);
    assert_eq!(config.index, Some(PathBuf::from("/var/lib/dupemirror/index.db")));
    assert_eq!(config.output, OutputFormat::Json);
    assert!(config.follow_symlinks);
    assert_eq!(config.commit_every, 1);
}

#[test]
fn test_env_overrides_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "extension = \"png\"\ncommit_every = 10\n").unwrap();

    std::env::set_var("DUPEMIRROR_EXTENSION", "gif");
    std::env::set_var("DUPEMIRROR_NO_INDEX", "true");
    let config = Config::load(Some(&path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.extension, "gif");
    assert_eq!(config.commit_every, 10);
    assert!(config.index_location().is_none());
}

#[test]
fn test_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "strategy = \"sha256\"\n").unwrap();

    std::env::set_var("DUPEMIRROR_DESTINATION", "/from/env");
    let loaded = Config::load(Some(&path));
    clear_env();
    let mut config = loaded.unwrap();
    assert_eq!(config.destination, Some(PathBuf::from("/from/env")));

    let cli = Cli::try_parse_from([
        "dupemirror",
        "scan",
        "--destination",
        "/from/cli",
        "--strategy",
        "ahash",
    ])
    .unwrap();
    let Commands::Scan(args) = cli.command else {
        panic!("Expected Scan command");
    };
    config.merge_cli(&args);

    assert_eq!(config.destination, Some(PathBuf::from("/from/cli")));
    assert_eq!(config.strategy, Strategy::Ahash);
}

#[test]
fn test_invalid_toml_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "extension = [unclosed").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_config_round_trips_through_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let original = Config {
        extension: "tar.gz".to_string(),
        strategy: Strategy::Sha256,
        destination: Some(PathBuf::from("/backup")),
        commit_every: 0,
        skip_hidden_dirs: true,
        ..Default::default()
    };
    fs::write(&path, toml::to_string(&original).unwrap()).unwrap();

    assert_eq!(Config::load(Some(&path)).unwrap(), original);
}
