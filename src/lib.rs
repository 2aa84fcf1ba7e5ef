//! Rich-menu designer core: a single persisted menu configuration, an editor
//! that writes it, and a live preview that follows it through a payload-less
//! change signal.

pub mod config;
pub mod editor;
pub mod layout;
pub mod logging;
pub mod menu;
pub mod notifier;
pub mod preview;
pub mod storage;
pub mod store;

pub use editor::{EditorUpdate, MenuEditor};
pub use layout::{resolve_layout, LayoutGeometry};
pub use menu::model::{ActionKind, MenuConfig, SlotAction, SlotKey, TabId, Template};
pub use notifier::{ChangeNotifier, Subscription};
pub use preview::{LivePreview, PreviewState};
pub use store::{ConfigReader, ConfigStore};
