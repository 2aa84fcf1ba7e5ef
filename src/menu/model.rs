use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::layout::{resolve_layout, LayoutGeometry};

/// The persisted rich-menu configuration shared by the editor and the preview.
///
/// Fields missing from a stored object take their default value, so older or
/// partially written snapshots still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuConfig {
    pub template: Template,
    pub use_tabs: bool,
    /// Only meaningful while `use_tabs` is set, but always holds a valid tab.
    pub active_tab: TabId,
    /// Only affects `large-1`.
    pub is_rotated: bool,
    /// Entries past the current template's slot count are kept but never rendered.
    pub slots: BTreeMap<SlotKey, SlotAction>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            template: Template::Grid3x2,
            use_tabs: true,
            active_tab: TabId::Tab1,
            is_rotated: false,
            slots: BTreeMap::new(),
        }
    }
}

impl MenuConfig {
    /// Default configuration with the two demo buttons pre-filled on the main tab.
    pub fn sample() -> Self {
        let mut config = Self::default();
        config.slots.insert(
            SlotKey::new(TabId::Tab1, 0),
            SlotAction::new(ActionKind::Web, "Booking site", "https://example.com"),
        );
        config.slots.insert(
            SlotKey::new(TabId::Tab1, 1),
            SlotAction::new(ActionKind::Tel, "Call to book", "03-1234-5678"),
        );
        config
    }

    pub fn geometry(&self) -> LayoutGeometry {
        resolve_layout(&self.template, self.is_rotated)
    }

    pub fn slot(&self, tab: TabId, index: usize) -> Option<&SlotAction> {
        self.slots.get(&SlotKey::new(tab, index))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Template {
    /// `grid-3x2`: six equal buttons.
    #[default]
    Grid3x2,
    /// `large-1`: one emphasized button plus two small ones.
    Large1,
    /// An id this build does not know. Kept verbatim so a save does not rewrite it.
    Other(String),
}

impl Template {
    pub const KNOWN: [Template; 2] = [Template::Grid3x2, Template::Large1];

    pub fn id(&self) -> &str {
        match self {
            Template::Grid3x2 => "grid-3x2",
            Template::Large1 => "large-1",
            Template::Other(id) => id,
        }
    }

    /// Strict parse used for operator input; stored data goes through `From<String>`.
    pub fn parse_known(value: &str) -> Result<Self> {
        match Template::from(value.trim().to_string()) {
            Template::Other(id) => Err(anyhow!(
                "Unknown template '{id}'. Expected one of: grid-3x2, large-1"
            )),
            known => Ok(known),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<String> for Template {
    fn from(value: String) -> Self {
        match value.as_str() {
            "grid-3x2" => Template::Grid3x2,
            "large-1" => Template::Large1,
            _ => Template::Other(value),
        }
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Template::from(value.to_string())
    }
}

impl From<Template> for String {
    fn from(value: Template) -> Self {
        match value {
            Template::Other(id) => id,
            known => known.id().to_string(),
        }
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Template::from)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TabId {
    #[default]
    #[serde(rename = "tab1")]
    Tab1,
    #[serde(rename = "tab2")]
    Tab2,
}

impl TabId {
    pub const ALL: [TabId; 2] = [TabId::Tab1, TabId::Tab2];

    pub fn as_str(self) -> &'static str {
        match self {
            TabId::Tab1 => "tab1",
            TabId::Tab2 => "tab2",
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "tab1" => Ok(TabId::Tab1),
            "tab2" => Ok(TabId::Tab2),
            other => bail!("Invalid tab '{other}'. Expected tab1 or tab2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Opens a URL.
    Web,
    /// Dials a phone number.
    Tel,
    /// Sends a literal chat message.
    Text,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Web, ActionKind::Tel, ActionKind::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Web => "web",
            ActionKind::Tel => "tel",
            ActionKind::Text => "text",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "web" => Ok(ActionKind::Web),
            "tel" => Ok(ActionKind::Tel),
            "text" => Ok(ActionKind::Text),
            other => bail!("Invalid action type '{other}'. Expected web, tel or text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

impl SlotAction {
    pub fn new(kind: ActionKind, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Composite slot address. Encoded as `"<tab>-<index>"` only when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub tab: TabId,
    pub index: usize,
}

impl SlotKey {
    pub fn new(tab: TabId, index: usize) -> Self {
        Self { tab, index }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tab, self.index)
    }
}

impl FromStr for SlotKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (tab, index) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Invalid slot key '{s}'. Expected <tab>-<index>, e.g. tab1-0"))?;
        let tab = tab.parse::<TabId>()?;
        // Only the canonical spelling, so two keys never name one slot.
        if !index.bytes().all(|b| b.is_ascii_digit())
            || (index.len() > 1 && index.starts_with('0'))
        {
            bail!("Invalid slot index in '{s}'. Expected a number without leading zeros");
        }
        let index = index
            .parse::<usize>()
            .with_context(|| format!("Invalid slot index in '{s}'"))?;
        Ok(Self { tab, index })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serializes_with_persisted_field_names() {
        let mut config = MenuConfig::default();
        config.slots.insert(
            SlotKey::new(TabId::Tab2, 3),
            SlotAction::new(ActionKind::Text, "FAQ", "Frequently asked questions"),
        );

        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(
            value,
            json!({
                "template": "grid-3x2",
                "useTabs": true,
                "activeTab": "tab1",
                "isRotated": false,
                "slots": {
                    "tab2-3": {"type": "text", "label": "FAQ", "value": "Frequently asked questions"}
                }
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: MenuConfig =
            serde_json::from_value(json!({"template": "large-1", "isRotated": true}))
                .expect("parse");
        assert_eq!(
            config,
            MenuConfig {
                template: Template::Large1,
                is_rotated: true,
                ..MenuConfig::default()
            }
        );
    }

    #[test]
    fn unknown_template_id_is_kept_verbatim() {
        let config: MenuConfig =
            serde_json::from_value(json!({"template": "list"})).expect("parse");
        assert_eq!(config.template, Template::Other("list".to_string()));

        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(value["template"], json!("list"));
    }

    #[test]
    fn slot_keys_parse_and_print() {
        let key: SlotKey = "tab2-11".parse().expect("parse");
        assert_eq!(key, SlotKey::new(TabId::Tab2, 11));
        assert_eq!(key.to_string(), "tab2-11");

        assert!("tab3-0".parse::<SlotKey>().is_err());
        assert!("tab1".parse::<SlotKey>().is_err());
        assert!("tab1-x".parse::<SlotKey>().is_err());
        assert_eq!("tab1-0".parse::<SlotKey>().expect("zero"), SlotKey::new(TabId::Tab1, 0));
    }

    #[test]
    fn non_canonical_slot_indices_are_rejected() {
        for raw in ["tab1-01", "tab1-00", "tab1-+1", "tab1-"] {
            assert!(raw.parse::<SlotKey>().is_err(), "{raw}");
        }
        let parsed = serde_json::from_value::<MenuConfig>(json!({
            "slots": {
                "tab1-1": {"type": "web", "label": "A", "value": ""},
                "tab1-01": {"type": "web", "label": "B", "value": ""}
            }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn malformed_slot_key_rejects_the_whole_value() {
        let parsed = serde_json::from_value::<MenuConfig>(json!({
            "slots": {"nope": {"type": "web", "label": "", "value": ""}}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_known_rejects_unknown_templates() {
        assert_eq!(Template::parse_known("large-1").expect("known"), Template::Large1);
        let err = Template::parse_known("list").expect_err("unknown");
        assert!(err.to_string().contains("grid-3x2, large-1"));
    }
}
