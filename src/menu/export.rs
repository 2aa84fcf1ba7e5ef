use serde::Serialize;

use crate::{
    layout::{AreaBounds, CANVAS_HEIGHT, CANVAS_WIDTH},
    menu::{
        common,
        model::{ActionKind, MenuConfig, SlotAction, TabId},
    },
};

pub const CHAT_BAR_TEXT: &str = "Menu";

/// Rich-menu object in the messaging platform's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichMenuDefinition {
    pub size: CanvasSize,
    pub selected: bool,
    pub name: String,
    pub chat_bar_text: String,
    pub areas: Vec<RichMenuArea>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichMenuArea {
    pub bounds: AreaBounds,
    pub action: AreaAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AreaAction {
    Uri { uri: String },
    Message { text: String },
}

impl AreaAction {
    fn for_slot(action: Option<&SlotAction>, index: usize) -> Self {
        match action {
            Some(SlotAction {
                kind: ActionKind::Web,
                value,
                ..
            }) => AreaAction::Uri { uri: value.clone() },
            Some(SlotAction {
                kind: ActionKind::Tel,
                value,
                ..
            }) => AreaAction::Uri {
                uri: format!("tel:{}", value.trim()),
            },
            Some(SlotAction {
                kind: ActionKind::Text,
                value,
                ..
            }) => AreaAction::Message { text: value.clone() },
            None => AreaAction::Message {
                text: common::slot_display_label(None, index),
            },
        }
    }
}

/// Builds the definition for one tab of `config`; slots past the template
/// range are not exported.
pub fn definition_for_tab(config: &MenuConfig, tab: TabId) -> RichMenuDefinition {
    let geometry = config.geometry();
    let areas = geometry
        .areas(CANVAS_WIDTH, CANVAS_HEIGHT)
        .into_iter()
        .zip(&geometry.slots)
        .map(|(bounds, placement)| RichMenuArea {
            bounds,
            action: AreaAction::for_slot(config.slot(tab, placement.index), placement.index),
        })
        .collect();

    let name = if config.use_tabs {
        format!(
            "{} / {}",
            common::template_name(&config.template),
            common::tab_label(tab)
        )
    } else {
        common::template_name(&config.template).to_string()
    };

    RichMenuDefinition {
        size: CanvasSize {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        },
        selected: true,
        name,
        chat_bar_text: CHAT_BAR_TEXT.to_string(),
        areas,
    }
}
