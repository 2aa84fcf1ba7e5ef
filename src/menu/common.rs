use crate::menu::model::{ActionKind, SlotAction, TabId, Template};

pub fn tab_label(tab: TabId) -> &'static str {
    match tab {
        TabId::Tab1 => "Menu A (main)",
        TabId::Tab2 => "Menu B (sub)",
    }
}

/// Tab caption as shown in the end-user tab bar.
pub fn tab_short_label(tab: TabId) -> &'static str {
    match tab {
        TabId::Tab1 => "Menu A",
        TabId::Tab2 => "Menu B",
    }
}

pub fn template_name(template: &Template) -> &str {
    match template {
        Template::Grid3x2 => "Standard (6 buttons)",
        Template::Large1 => "Featured (1 large + 2 small)",
        Template::Other(id) => id,
    }
}

pub fn orientation_label(is_rotated: bool) -> &'static str {
    if is_rotated {
        "portrait split"
    } else {
        "landscape split"
    }
}

pub fn action_icon(kind: Option<ActionKind>) -> &'static str {
    match kind {
        Some(ActionKind::Tel) => "call",
        Some(ActionKind::Web) => "public",
        Some(ActionKind::Text) | None => "smart_button",
    }
}

pub fn value_caption(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Web => "URL",
        ActionKind::Tel => "Phone number",
        ActionKind::Text => "Message text",
    }
}

pub fn value_placeholder(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Tel => "03-1234-5678",
        ActionKind::Web | ActionKind::Text => "https://...",
    }
}

pub fn action_kind_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Web => "Open website",
        ActionKind::Tel => "Place a call",
        ActionKind::Text => "Send message",
    }
}

/// Button caption in a rendered grid: the label, or `Btn N` when unset.
pub fn slot_display_label(action: Option<&SlotAction>, index: usize) -> String {
    match action {
        Some(action) if !action.label.is_empty() => action.label.clone(),
        _ => format!("Btn {}", index + 1),
    }
}

/// Starting form value for a slot the operator has not configured yet.
pub fn default_form_action(index: usize) -> SlotAction {
    SlotAction::new(ActionKind::Web, format!("Button #{}", index + 1), "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_labels_fall_back_to_button_number() {
        let blank = SlotAction::new(ActionKind::Tel, "", "03");
        assert_eq!(slot_display_label(Some(&blank), 2), "Btn 3");
        assert_eq!(slot_display_label(None, 0), "Btn 1");

        let named = SlotAction::new(ActionKind::Tel, "Call", "03");
        assert_eq!(slot_display_label(Some(&named), 0), "Call");
    }

    #[test]
    fn unknown_template_shows_its_id() {
        assert_eq!(template_name(&Template::from("list")), "list");
    }
}
