use std::{path::PathBuf, rc::Rc};

use anyhow::{Context, Result};

use crate::config;

/// Local durable key-value storage holding string values, one per named slot.
pub trait KvStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replaces the value; readers see either the old or the new value, never a mix.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Human-readable location, for logs and `state-path`.
    fn location(&self) -> String;
}

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Opens the file-backed storage in `dir`, or in the resolved state directory.
pub fn open(dir: Option<PathBuf>) -> Result<Rc<dyn KvStorage>> {
    let dir = config::ensure_state_dir(dir).context("prepare state directory")?;
    Ok(Rc::new(FileStorage::new(dir)))
}
