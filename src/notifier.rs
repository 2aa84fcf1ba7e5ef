use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use tracing::trace;

/// Name of the "menu config changed" signal.
pub const RICH_MENU_CHANNEL: &str = "storage-rich-menu";

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Handler)>,
}

/// Payload-less broadcast: listeners are told "re-read the store", never
/// handed the data. Clones share one listener list.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    registry: Rc<RefCell<Registry>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every later `publish`. Dropping the returned
    /// guard (or calling [`Subscription::unsubscribe`]) deregisters it.
    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Rc::new(handler)));
        trace!(channel = RICH_MENU_CHANNEL, id, "listener registered");
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Calls every handler registered at the time of the call, in
    /// registration order. Handlers may subscribe or unsubscribe freely.
    pub fn publish(&self) {
        let snapshot: Vec<Handler> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        trace!(channel = RICH_MENU_CHANNEL, listeners = snapshot.len(), "publish");
        for handler in snapshot {
            handler();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Registration guard returned by [`ChangeNotifier::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .borrow_mut()
            .listeners
            .retain(|(id, _)| *id != self.id);
        trace!(channel = RICH_MENU_CHANNEL, id = self.id, "listener removed");
    }
}
