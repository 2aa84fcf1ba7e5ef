use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{menu::model::MenuConfig, storage::KvStorage};

/// Name of the slot holding the serialized [`MenuConfig`].
pub const CONFIG_SLOT: &str = "richMenuConfig";

/// Single writer of the persisted menu configuration.
///
/// `load` never fails: an absent, unreadable or unparsable slot yields
/// [`MenuConfig::default`]. `save` does not notify anyone.
pub struct ConfigStore {
    storage: Rc<dyn KvStorage>,
    slot: String,
}

impl ConfigStore {
    pub fn new(storage: Rc<dyn KvStorage>) -> Self {
        Self::with_slot(storage, CONFIG_SLOT)
    }

    pub fn with_slot(storage: Rc<dyn KvStorage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    pub fn load(&self) -> MenuConfig {
        load_slot(&*self.storage, &self.slot)
    }

    pub fn save(&self, config: &MenuConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config).context("serialize menu config")?;
        self.storage
            .set(&self.slot, &json)
            .with_context(|| format!("write slot '{}' in {}", self.slot, self.storage.location()))?;
        debug!(
            slot = %self.slot,
            template = %config.template,
            slots = config.slots.len(),
            "saved menu config"
        );
        Ok(())
    }

    /// Drops the persisted value; the next `load` returns the default.
    pub fn clear(&self) -> Result<()> {
        self.storage
            .remove(&self.slot)
            .with_context(|| format!("clear slot '{}' in {}", self.slot, self.storage.location()))
    }

    /// Read-only handle over the same slot.
    pub fn reader(&self) -> ConfigReader {
        ConfigReader {
            storage: Rc::clone(&self.storage),
            slot: self.slot.clone(),
        }
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }
}

/// Load-only view of the store. Components that must never write get this.
#[derive(Clone)]
pub struct ConfigReader {
    storage: Rc<dyn KvStorage>,
    slot: String,
}

impl ConfigReader {
    pub fn load(&self) -> MenuConfig {
        load_slot(&*self.storage, &self.slot)
    }
}

fn load_slot(storage: &dyn KvStorage, slot: &str) -> MenuConfig {
    let raw = match storage.get(slot) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(slot, "no persisted menu config, using default");
            return MenuConfig::default();
        }
        Err(e) => {
            warn!(slot, "failed to read menu config, using default: {e:#}");
            return MenuConfig::default();
        }
    };

    match serde_json::from_str::<MenuConfig>(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!(slot, "ignoring unparsable menu config: {e}");
            MenuConfig::default()
        }
    }
}
