use std::{
    cell::RefCell,
    fmt::{self, Write},
    rc::Rc,
};

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::{
    menu::{
        export,
        model::{MenuConfig, TabId},
        render::{self, GridView},
    },
    notifier::{ChangeNotifier, Subscription},
    store::ConfigReader,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Unmounted,
    Loading,
    Displaying,
}

#[derive(Debug)]
struct View {
    state: PreviewState,
    config: MenuConfig,
    displayed_tab: TabId,
    reloads: usize,
    dirty: bool,
}

impl View {
    fn apply(&mut self, config: MenuConfig) {
        if self.state == PreviewState::Unmounted {
            return;
        }
        // The stored tab only picks the tab shown on first load.
        if self.state == PreviewState::Loading {
            self.displayed_tab = config.active_tab;
        }
        self.config = config;
        self.state = PreviewState::Displaying;
        self.reloads += 1;
        self.dirty = true;
    }
}

/// Read-only simulation of the end-user chat surface.
///
/// Holds no reference to the editor: it re-reads the store whenever the
/// notifier fires and treats the fresh value as the whole truth.
pub struct LivePreview {
    view: Rc<RefCell<View>>,
    subscription: Option<Subscription>,
}

impl LivePreview {
    /// Subscribes, then loads once so an existing config shows before any edit.
    pub fn mount(reader: ConfigReader, notifier: &ChangeNotifier) -> Self {
        let view = Rc::new(RefCell::new(View {
            state: PreviewState::Loading,
            config: MenuConfig::default(),
            displayed_tab: TabId::Tab1,
            reloads: 0,
            dirty: false,
        }));

        let weak = Rc::downgrade(&view);
        let handler_reader = reader.clone();
        let subscription = notifier.subscribe(move || {
            let Some(view) = weak.upgrade() else {
                return;
            };
            let config = handler_reader.load();
            debug!(template = %config.template, "preview reload");
            view.borrow_mut().apply(config);
        });

        view.borrow_mut().apply(reader.load());
        info!("preview mounted");

        Self {
            view,
            subscription: Some(subscription),
        }
    }

    /// Terminal: unsubscribes and stops following the store.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            self.view.borrow_mut().state = PreviewState::Unmounted;
            info!("preview unmounted");
        }
    }

    pub fn state(&self) -> PreviewState {
        self.view.borrow().state
    }

    pub fn config(&self) -> MenuConfig {
        self.view.borrow().config.clone()
    }

    pub fn displayed_tab(&self) -> TabId {
        self.view.borrow().displayed_tab
    }

    /// Number of loads applied since mount, the initial one included.
    pub fn reload_count(&self) -> usize {
        self.view.borrow().reloads
    }

    /// True once after each reload; lets a render loop redraw only when needed.
    pub fn take_refresh(&self) -> bool {
        std::mem::take(&mut self.view.borrow_mut().dirty)
    }

    /// Local tab switch. Ignored while the menu has no tabs or after unmount.
    pub fn select_tab(&mut self, tab: TabId) -> bool {
        let mut view = self.view.borrow_mut();
        if view.state != PreviewState::Displaying || !view.config.use_tabs {
            return false;
        }
        if view.displayed_tab != tab {
            view.displayed_tab = tab;
            view.dirty = true;
        }
        true
    }

    pub fn grid(&self) -> GridView {
        let view = self.view.borrow();
        GridView::build(&view.config, view.displayed_tab, None)
    }

    /// What tapping button `index` (zero-based) would do for an end user.
    pub fn press(&self, index: usize) -> Result<String> {
        let view = self.view.borrow();
        let count = view.config.geometry().slot_count();
        if index >= count {
            bail!("Button {} is not on this menu ({count} buttons)", index + 1);
        }
        let action = view.config.slot(view.displayed_tab, index);
        let label = match action {
            Some(a) if !a.label.is_empty() => a.label.as_str(),
            _ => "Empty",
        };
        let kind = action.map_or("web", |a| a.kind.as_str());
        let value = match action {
            Some(a) if !a.value.is_empty() => a.value.as_str(),
            _ => "empty",
        };
        Ok(format!(
            "Button {} clicked: {label}\nAction: {kind} -> {value}",
            index + 1
        ))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Err(err) = self.write_frame(&mut out) {
            warn!("preview frame incomplete: {err}");
        }
        out
    }

    fn write_frame(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "== Med CRM (live preview) ==")?;
        let (use_tabs, tab) = {
            let view = self.view.borrow();
            (view.config.use_tabs, view.displayed_tab)
        };
        if use_tabs {
            writeln!(out, "{}", render::render_tab_bar(tab))?;
        }
        writeln!(out, "{}", self.grid().render())?;
        writeln!(out, "Chat bar: {}", export::CHAT_BAR_TEXT)
    }
}

impl Drop for LivePreview {
    fn drop(&mut self) {
        self.unmount();
    }
}
