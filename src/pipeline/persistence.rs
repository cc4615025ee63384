// to be called on main startup and quit; saves settings so we can reload them later
use std::path::{Path, PathBuf};

use crate::pipeline::config::Config;

const PISONIC_DIR: &str = ".pisonic";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "pisonic.log";

// <project_dir>/.pisonic/config.json
fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PISONIC_DIR).join(CONFIG_FILE)
}

pub fn log_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PISONIC_DIR).join(LOG_FILE)
}

pub fn load_config(project_dir: &Path) -> Option<Config> {
    let path = config_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

// Save the settings to disk, making the files if they don't exist already
pub fn save_config(project_dir: &Path, cfg: &Config) -> anyhow::Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .pisonic/ if needed
    }
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(&path, json)?;
    Ok(())
}
