use std::fs;

use assert_cmd::Command;
use olaf::fs::real::CONFIG_DIR_ENV;
use tempfile::TempDir;

/// A temporary home with an empty `.config/olaf`
#[must_use]
pub fn setup_default_test_config() -> TempDir {
    _setup_test_config(None)
}

/// A temporary home whose `.config/olaf/config.yaml` holds `config_yaml`
#[must_use]
pub fn setup_test_config(config_yaml: &str) -> TempDir {
    _setup_test_config(Some(config_yaml))
}

fn _setup_test_config(config_yaml: Option<&str>) -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();

    let config_dir = config_dir(&temp_dir);
    fs::create_dir_all(&config_dir).unwrap();

    if let Some(yaml) = config_yaml {
        fs::write(config_dir.join("config.yaml"), yaml).unwrap();
    }

    temp_dir
}

fn config_dir(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join(".config").join("olaf")
}

/// The binary with its config directory pointed into `temp_dir`
#[must_use]
pub fn get_command_with_test_config(temp_dir: &TempDir) -> Command {
    let mut cmd = get_command();
    cmd.env(CONFIG_DIR_ENV, config_dir(temp_dir));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[must_use]
pub fn get_command() -> Command {
    Command::cargo_bin("olaf-cli").unwrap()
}
