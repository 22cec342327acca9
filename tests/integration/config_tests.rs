use clap::Parser;
use dedupe::cli::Cli;
use dedupe::config::{Config, ConfigError};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DEDUPE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_layering_defaults_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "min_size = 100\nprefix_bytes = 64\nio_threads = 2\n",
    )
    .unwrap();

    std::env::set_var("DEDUPE_PREFIX_BYTES", "128");
    std::env::set_var("DEDUPE_IO_THREADS", "6");
    let loaded = Config::load(Some(&path));
    clear_env();
    let loaded = loaded.unwrap();

    // file beats defaults, env beats file
    assert_eq!(loaded.min_size, 100);
    assert_eq!(loaded.prefix_bytes, 128);
    assert_eq!(loaded.io_threads, 6);
    assert!(loaded.use_cache);

    // CLI beats env
    let cli = Cli::parse_from(["dedupe", "--io-threads", "1", "/tmp"]);
    let config = loaded.with_cli_overrides(&cli);
    assert_eq!(config.io_threads, 1);
    assert_eq!(config.prefix_bytes, 128);
}

#[test]
fn test_env_disables_cache() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();

    std::env::set_var("DEDUPE_USE_CACHE", "false");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert!(!config.use_cache);
    assert!(config.resolved_cache_path().is_none());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 5\nfuture_option = true\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.min_size, 5);
}

#[test]
fn test_zero_threads_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 0\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidIoThreads(0))
    ));
}

#[test]
fn test_cli_flag_rescues_invalid_env_value() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 0
").unwrap();

    std::env::set_var("DEDUPE_PREFIX_BYTES", "0");
    let loaded = Config::load(Some(&path));
    clear_env();

    let cli = Cli::parse_from([
        "dedupe",
        "--prefix-bytes",
        "512",
        "--io-threads",
        "2",
        "/tmp",
    ]);
    let config = loaded.unwrap().with_cli_overrides(&cli);

    assert_eq!(config.prefix_bytes, 512);
    assert_eq!(config.io_threads, 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_override_validated() {
    let cli = Cli::parse_from(["dedupe", "--prefix-bytes", "0", "/tmp"]);
    let config = Config::default().with_cli_overrides(&cli);

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidPrefixLength(0))
    ));
}
