use std::{env, fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};

pub const STATE_DIR_ENV: &str = "RICHMENU_STATE_DIR";
pub const LOCAL_STATE_DIR: &str = ".richmenu";
const APP_DIR: &str = "richmenu";

/// Where the durable slots live, in order of preference:
/// `RICHMENU_STATE_DIR`, an existing `./.richmenu`, `%APPDATA%/richmenu`,
/// `$HOME/.config/richmenu`.
pub fn resolve_state_dir() -> Option<PathBuf> {
    if let Ok(p) = env::var(STATE_DIR_ENV) {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let local = PathBuf::from(LOCAL_STATE_DIR);
    if local.is_dir() {
        return Some(local);
    }

    if let Some(appdata) = env::var_os("APPDATA") {
        return Some(PathBuf::from(appdata).join(APP_DIR));
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join(APP_DIR));
    }

    None
}

/// Creates the state directory (explicit `dir` wins over resolution) and returns it.
pub fn ensure_state_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let Some(dir) = dir.or_else(resolve_state_dir) else {
        return Err(anyhow!(
            "No state directory available (set {STATE_DIR_ENV} or ensure APPDATA/HOME is present)"
        ));
    };

    fs::create_dir_all(&dir).with_context(|| format!("create state dir {}", dir.display()))?;
    Ok(dir)
}
