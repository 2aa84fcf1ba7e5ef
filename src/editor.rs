use std::fmt::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::{
    menu::{
        commands::{EditCommand, SlotField},
        common,
        export::{self, RichMenuDefinition},
        model::{MenuConfig, SlotAction, SlotKey, TabId, Template},
        render::{self, GridView},
    },
    notifier::ChangeNotifier,
    store::ConfigStore,
};

/// Operator-facing editor. Owns the only [`ConfigStore`] in the process.
///
/// Every committed change is saved first and published second, so a
/// listener that reloads on the notification always sees the new value.
pub struct MenuEditor {
    draft: MenuConfig,
    selected_slot: Option<usize>,
    store: ConfigStore,
    notifier: ChangeNotifier,
    last_error: Option<String>,
    /// The draft holds changes the last save did not persist.
    unsaved: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditorUpdate {
    /// The draft was saved and listeners were notified.
    pub published: bool,
    /// Selection or form contents changed.
    pub refresh_form: bool,
    /// `last_error` changed.
    pub refresh_status: bool,
}

impl MenuEditor {
    pub fn mount(store: ConfigStore, notifier: ChangeNotifier) -> Self {
        let draft = store.load();
        info!(
            location = %store.location(),
            template = %draft.template,
            slots = draft.slots.len(),
            "editor mounted"
        );
        Self {
            draft,
            selected_slot: Some(0),
            store,
            notifier,
            last_error: None,
            unsaved: false,
        }
    }

    pub fn draft(&self) -> &MenuConfig {
        &self.draft
    }

    pub fn selected_slot(&self) -> Option<usize> {
        self.selected_slot
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn handle(&mut self, cmd: EditCommand) -> EditorUpdate {
        let result = match cmd {
            EditCommand::Template(template) => self.set_template(template),
            EditCommand::UseTabs(enabled) => self.set_use_tabs(enabled),
            EditCommand::ActiveTab(tab) => self.set_active_tab(tab),
            EditCommand::ToggleRotation => self.toggle_rotation(),
            EditCommand::Select(index) => self.select_slot(index),
            EditCommand::SetField(field) => self.update_selected(field),
            EditCommand::ClearSlot => self.clear_selected(),
        };
        result.unwrap_or_else(|err| self.note_error(err))
    }

    /// Switches template. Slot entries beyond the new range stay in place.
    pub fn set_template(&mut self, template: Template) -> Result<EditorUpdate> {
        if self.draft.template == template && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        self.draft.template = template;

        let mut refresh_form = false;
        if let Some(index) = self.selected_slot {
            if index >= self.draft.geometry().slot_count() {
                self.selected_slot = None;
                refresh_form = true;
            }
        }

        let update = self.commit()?;
        Ok(EditorUpdate {
            refresh_form,
            ..update
        })
    }

    pub fn set_use_tabs(&mut self, enabled: bool) -> Result<EditorUpdate> {
        if self.draft.use_tabs == enabled && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        self.draft.use_tabs = enabled;
        self.commit()
    }

    pub fn set_active_tab(&mut self, tab: TabId) -> Result<EditorUpdate> {
        if self.draft.active_tab == tab && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        self.draft.active_tab = tab;
        let update = self.commit()?;
        Ok(EditorUpdate {
            refresh_form: true,
            ..update
        })
    }

    pub fn toggle_rotation(&mut self) -> Result<EditorUpdate> {
        self.draft.is_rotated = !self.draft.is_rotated;
        self.commit()
    }

    /// Local selection only: nothing is saved or published.
    pub fn select_slot(&mut self, index: usize) -> Result<EditorUpdate> {
        let count = self.draft.geometry().slot_count();
        if index >= count {
            bail!(
                "Button #{} does not exist in {} (it has {count} buttons)",
                index + 1,
                self.draft.template
            );
        }
        self.selected_slot = Some(index);
        Ok(EditorUpdate {
            refresh_form: true,
            ..Default::default()
        })
    }

    /// Form contents for the selected slot, falling back to the starter action.
    pub fn current_action(&self) -> Option<SlotAction> {
        let index = self.selected_slot?;
        let action = self
            .draft
            .slot(self.draft.active_tab, index)
            .cloned()
            .unwrap_or_else(|| common::default_form_action(index));
        Some(action)
    }

    pub fn update_selected(&mut self, field: SlotField) -> Result<EditorUpdate> {
        let Some(index) = self.selected_slot else {
            bail!("No button selected");
        };
        let Some(mut action) = self.current_action() else {
            bail!("No button selected");
        };
        match field {
            SlotField::Kind(kind) => action.kind = kind,
            SlotField::Label(label) => action.label = label,
            SlotField::Value(value) => action.value = value,
        }
        self.set_slot(SlotKey::new(self.draft.active_tab, index), action)
    }

    pub fn set_slot(&mut self, key: SlotKey, action: SlotAction) -> Result<EditorUpdate> {
        if self.draft.slots.get(&key) == Some(&action) && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        debug!(slot = %key, kind = %action.kind, "slot updated");
        self.draft.slots.insert(key, action);
        let update = self.commit()?;
        Ok(EditorUpdate {
            refresh_form: true,
            ..update
        })
    }

    pub fn clear_slot(&mut self, key: SlotKey) -> Result<EditorUpdate> {
        if self.draft.slots.remove(&key).is_none() && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        let update = self.commit()?;
        Ok(EditorUpdate {
            refresh_form: true,
            ..update
        })
    }

    fn clear_selected(&mut self) -> Result<EditorUpdate> {
        let Some(index) = self.selected_slot else {
            bail!("No button selected");
        };
        self.clear_slot(SlotKey::new(self.draft.active_tab, index))
    }

    /// Replaces the whole draft (e.g. with the sample menu).
    pub fn replace(&mut self, config: MenuConfig) -> Result<EditorUpdate> {
        if self.draft == config && !self.unsaved {
            return Ok(EditorUpdate::default());
        }
        self.draft = config;
        self.selected_slot = Some(0);
        let update = self.commit()?;
        Ok(EditorUpdate {
            refresh_form: true,
            ..update
        })
    }

    /// Activation stub: builds the definitions that would be sent to the
    /// messaging backend. Nothing leaves the process.
    pub fn publish_menu(&self) -> Vec<RichMenuDefinition> {
        let tabs: Vec<TabId> = if self.draft.use_tabs {
            TabId::ALL.to_vec()
        } else {
            vec![self.draft.active_tab]
        };
        let definitions: Vec<RichMenuDefinition> = tabs
            .into_iter()
            .map(|tab| export::definition_for_tab(&self.draft, tab))
            .collect();
        info!(
            menus = definitions.len(),
            "publishing is not connected to a messaging backend; nothing was sent"
        );
        definitions
    }

    pub fn grid(&self) -> GridView {
        GridView::build(&self.draft, self.draft.active_tab, self.selected_slot)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Err(err) = self.write_frame(&mut out) {
            warn!("editor frame incomplete: {err}");
        }
        out
    }

    fn write_frame(&self, out: &mut impl Write) -> fmt::Result {
        let draft = &self.draft;
        writeln!(out, "== Rich menu editor ==")?;
        writeln!(
            out,
            "Template : {} [{}]",
            common::template_name(&draft.template),
            draft.template
        )?;
        if draft.template == Template::Large1 {
            writeln!(out, "Layout   : {}", common::orientation_label(draft.is_rotated))?;
        }
        if draft.use_tabs {
            writeln!(out, "Tabs     : on, editing {}", common::tab_label(draft.active_tab))?;
            writeln!(out, "{}", render::render_tab_bar(draft.active_tab))?;
        } else {
            writeln!(out, "Tabs     : off")?;
        }
        writeln!(out, "{}", self.grid().render())?;

        match (self.selected_slot, self.current_action()) {
            (Some(index), Some(action)) => {
                writeln!(out, "Selected : button #{}", index + 1)?;
                writeln!(
                    out,
                    "  Action : {} ({})",
                    common::action_kind_label(action.kind),
                    action.kind
                )?;
                writeln!(out, "  Label  : {}", action.label)?;
                let value = if action.value.is_empty() {
                    format!("<{}>", common::value_placeholder(action.kind))
                } else {
                    action.value.clone()
                };
                writeln!(out, "  {:<7}: {value}", common::value_caption(action.kind))?;
            }
            _ => writeln!(out, "Select a button to edit it")?,
        }

        if let Some(err) = self.last_error.as_deref() {
            writeln!(out, "Error    : {err}")?;
        }
        Ok(())
    }

    /// Saves the whole draft, then notifies. On failure the draft stays
    /// marked unsaved so the next edit retries even if it changes nothing.
    fn commit(&mut self) -> Result<EditorUpdate> {
        self.unsaved = true;
        self.store
            .save(&self.draft)
            .context("save rich menu draft")?;
        self.unsaved = false;
        self.notifier.publish();
        let had_error = self.last_error.take().is_some();
        Ok(EditorUpdate {
            published: true,
            refresh_status: had_error,
            ..Default::default()
        })
    }

    fn note_error(&mut self, err: anyhow::Error) -> EditorUpdate {
        warn!("editor: {err:#}");
        self.last_error = Some(format!("{err:#}"));
        EditorUpdate {
            refresh_status: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        menu::model::ActionKind,
        storage::{KvStorage, MemoryStorage},
        store::CONFIG_SLOT,
    };
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use std::{cell::Cell, rc::Rc};

    struct Harness {
        storage: Rc<MemoryStorage>,
        notifier: ChangeNotifier,
        publishes: Rc<Cell<usize>>,
        _sub: crate::notifier::Subscription,
    }

    fn mount() -> (Harness, MenuEditor) {
        let storage = Rc::new(MemoryStorage::new());
        let notifier = ChangeNotifier::new();
        let publishes = Rc::new(Cell::new(0));
        let sub = notifier.subscribe({
            let publishes = publishes.clone();
            move || publishes.set(publishes.get() + 1)
        });
        let editor = MenuEditor::mount(ConfigStore::new(storage.clone()), notifier.clone());
        (
            Harness {
                storage,
                notifier,
                publishes,
                _sub: sub,
            },
            editor,
        )
    }

    fn stored(h: &Harness) -> MenuConfig {
        ConfigStore::new(h.storage.clone()).load()
    }

    #[test]
    fn field_edits_save_then_publish() {
        let (h, mut editor) = mount();

        let update = editor.handle(EditCommand::Template(Template::Large1));
        assert!(update.published);
        assert_eq!(h.publishes.get(), 1);
        assert_eq!(stored(&h).template, Template::Large1);

        editor.handle(EditCommand::SetField(SlotField::Label("Book".to_string())));
        assert_eq!(h.publishes.get(), 2);
        assert_eq!(
            stored(&h).slot(TabId::Tab1, 0),
            Some(&SlotAction::new(ActionKind::Web, "Book", ""))
        );
    }

    #[test]
    fn selecting_a_slot_does_not_persist_or_publish() {
        let (h, mut editor) = mount();

        let update = editor.handle(EditCommand::Select(4));
        assert_eq!(
            update,
            EditorUpdate {
                refresh_form: true,
                ..Default::default()
            }
        );
        assert_eq!(editor.selected_slot(), Some(4));
        assert_eq!(h.publishes.get(), 0);
        assert_eq!(h.storage.get(CONFIG_SLOT).expect("get"), None);
    }

    #[test]
    fn unchanged_values_are_not_republished() {
        let (h, mut editor) = mount();
        editor.handle(EditCommand::Template(Template::Grid3x2));
        editor.handle(EditCommand::UseTabs(true));
        editor.handle(EditCommand::ActiveTab(TabId::Tab1));
        assert_eq!(h.publishes.get(), 0);
    }

    #[test]
    fn template_switch_keeps_out_of_range_slots() {
        let (h, mut editor) = mount();
        let key = SlotKey::new(TabId::Tab1, 4);
        let action = SlotAction::new(ActionKind::Tel, "X", "03-0000-0000");

        editor.set_slot(key, action.clone()).expect("set slot");
        editor.set_template(Template::Large1).expect("large");
        assert_eq!(stored(&h).slots.get(&key), Some(&action));
        editor.set_template(Template::Grid3x2).expect("grid");

        assert_eq!(editor.draft().slots.get(&key), Some(&action));
        assert_eq!(stored(&h).slots.get(&key), Some(&action));
    }

    #[test]
    fn shrinking_template_drops_out_of_range_selection() {
        let (_h, mut editor) = mount();
        editor.handle(EditCommand::Select(5));
        let update = editor.handle(EditCommand::Template(Template::Large1));
        assert!(update.refresh_form);
        assert_eq!(editor.selected_slot(), None);
        assert_eq!(editor.current_action(), None);
    }

    #[test]
    fn out_of_range_selection_is_reported() {
        let (h, mut editor) = mount();
        editor.handle(EditCommand::Template(Template::Large1));
        let update = editor.handle(EditCommand::Select(3));
        assert!(update.refresh_status);
        assert_eq!(editor.selected_slot(), Some(0));
        assert!(editor.last_error().is_some_and(|e| e.contains("Button #4")));
        assert_eq!(h.publishes.get(), 1);
    }

    #[test]
    fn first_edit_of_empty_slot_starts_from_starter_action() {
        let (h, mut editor) = mount();
        editor.handle(EditCommand::ActiveTab(TabId::Tab2));
        editor.handle(EditCommand::Select(2));
        assert_eq!(
            editor.current_action(),
            Some(SlotAction::new(ActionKind::Web, "Button #3", ""))
        );

        editor.handle(EditCommand::SetField(SlotField::Kind(ActionKind::Text)));
        assert_eq!(
            stored(&h).slot(TabId::Tab2, 2),
            Some(&SlotAction::new(ActionKind::Text, "Button #3", ""))
        );
    }

    #[test]
    fn clearing_the_selected_slot_publishes_once() {
        let (h, mut editor) = mount();
        editor.handle(EditCommand::SetField(SlotField::Value("https://x".to_string())));
        editor.handle(EditCommand::ClearSlot);
        editor.handle(EditCommand::ClearSlot);
        assert_eq!(h.publishes.get(), 2);
        assert!(stored(&h).slots.is_empty());
    }

    #[test]
    fn rotation_toggles_and_publishes() {
        let (h, mut editor) = mount();
        editor.handle(EditCommand::ToggleRotation);
        editor.handle(EditCommand::ToggleRotation);
        assert_eq!(h.publishes.get(), 2);
        assert!(!stored(&h).is_rotated);
    }

    #[test]
    fn mount_picks_up_existing_config() {
        let storage = Rc::new(MemoryStorage::new());
        ConfigStore::new(storage.clone())
            .save(&MenuConfig::sample())
            .expect("save");
        let editor = MenuEditor::mount(ConfigStore::new(storage), ChangeNotifier::new());
        assert_eq!(editor.draft(), &MenuConfig::sample());
        assert_eq!(editor.current_action().map(|a| a.label), Some("Booking site".to_string()));
    }

    struct ReadOnlyStorage;

    impl KvStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk is read-only"))
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn location(&self) -> String {
            "<read-only>".to_string()
        }
    }

    #[test]
    fn failed_save_is_recorded_and_not_published() {
        let notifier = ChangeNotifier::new();
        let publishes = Rc::new(Cell::new(0));
        let _sub = notifier.subscribe({
            let publishes = publishes.clone();
            move || publishes.set(publishes.get() + 1)
        });
        let mut editor = MenuEditor::mount(ConfigStore::new(Rc::new(ReadOnlyStorage)), notifier);

        let update = editor.handle(EditCommand::UseTabs(false));
        assert!(!update.published);
        assert!(update.refresh_status);
        assert_eq!(publishes.get(), 0);
        assert!(!editor.draft().use_tabs);
        assert!(editor
            .last_error()
            .is_some_and(|e| e.contains("disk is read-only")));
    }

    /// Fails the first `failures` writes, then behaves like memory storage.
    struct FlakyStorage {
        inner: MemoryStorage,
        failures: Cell<usize>,
    }

    impl KvStorage for FlakyStorage {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(anyhow!("disk full"));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.inner.remove(key)
        }
        fn location(&self) -> String {
            "<flaky>".to_string()
        }
    }

    #[test]
    fn retrying_an_edit_after_a_failed_save_persists_it() {
        let storage = Rc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            failures: Cell::new(1),
        });
        let store = ConfigStore::new(storage.clone());
        let reader = store.reader();
        let notifier = ChangeNotifier::new();
        let publishes = Rc::new(Cell::new(0));
        let _sub = notifier.subscribe({
            let publishes = publishes.clone();
            move || publishes.set(publishes.get() + 1)
        });
        let mut editor = MenuEditor::mount(store, notifier);

        let first = editor.handle(EditCommand::UseTabs(false));
        assert!(!first.published);
        assert!(reader.load().use_tabs);

        let retry = editor.handle(EditCommand::UseTabs(false));
        assert_eq!(
            retry,
            EditorUpdate {
                published: true,
                refresh_form: false,
                refresh_status: true,
            }
        );
        assert_eq!(publishes.get(), 1);
        assert_eq!(editor.last_error(), None);
        assert_eq!(reader.load(), *editor.draft());

        assert_eq!(editor.handle(EditCommand::UseTabs(false)), EditorUpdate::default());
        assert_eq!(publishes.get(), 1);
    }

    #[test]
    fn clearing_an_empty_slot_retries_a_failed_save() {
        let storage = Rc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            failures: Cell::new(1),
        });
        let store = ConfigStore::new(storage.clone());
        let reader = store.reader();
        let mut editor = MenuEditor::mount(store, ChangeNotifier::new());

        editor.handle(EditCommand::Template(Template::Large1));
        assert_eq!(reader.load().template, Template::Grid3x2);

        let update = editor.handle(EditCommand::ClearSlot);
        assert!(update.published);
        assert_eq!(reader.load().template, Template::Large1);
    }

    #[test]
    fn publish_menu_exports_each_visible_tab() {
        let (h, mut editor) = mount();
        assert_eq!(editor.publish_menu().len(), 2);
        editor.handle(EditCommand::UseTabs(false));
        assert_eq!(editor.publish_menu().len(), 1);
        assert_eq!(h.notifier.listener_count(), 1);
    }

    #[test]
    fn render_shows_form_for_selected_button() {
        let (_h, mut editor) = mount();
        editor.handle(EditCommand::SetField(SlotField::Kind(ActionKind::Tel)));
        let frame = editor.render();
        assert!(frame.contains("Selected : button #1"));
        assert!(frame.contains("Action : Place a call (tel)"));
        assert!(frame.contains("<03-1234-5678>"));
        assert!(frame.contains("[Button #1]"));
    }
}
