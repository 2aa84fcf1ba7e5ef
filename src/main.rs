use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use richmenu::{
    config, logging,
    menu::{export, model::ActionKind},
    storage, ChangeNotifier, ConfigStore, EditorUpdate, LivePreview, MenuConfig, MenuEditor,
    SlotAction, SlotKey, TabId, Template,
};

#[derive(Parser, Debug)]
#[command(name = "richmenuctl", version, about = "Rich-menu designer for the clinic chat channel")]
struct Cli {
    /// Directory holding the persisted menu. Defaults to $RICHMENU_STATE_DIR,
    /// ./.richmenu, %APPDATA%/richmenu or ~/.config/richmenu.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the stored configuration as JSON.
    Show,
    /// Renders the end-user preview.
    Preview {
        /// Tab to show; defaults to the stored active tab.
        #[arg(long)]
        tab: Option<TabId>,
    },
    /// Picks the menu template (grid-3x2 or large-1).
    Template { id: String },
    /// Splits the menu into two switchable tabs, or not.
    Tabs {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Sets the tab being edited.
    Tab { tab: TabId },
    /// Flips the large-1 orientation.
    Rotate,
    /// Sets the action of one button, e.g. `slot tab1-4 --type tel --label X --value 03-0000-0000`.
    Slot {
        key: SlotKey,
        #[arg(long = "type")]
        kind: ActionKind,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, default_value = "")]
        value: String,
    },
    /// Removes the action of one button.
    ClearSlot { key: SlotKey },
    /// Prints the platform rich-menu definition for a tab.
    Export {
        #[arg(long)]
        tab: Option<TabId>,
    },
    /// Builds the definitions for activation. Not connected to a backend.
    Publish,
    /// Replaces the stored menu with the demo sample.
    Seed,
    /// Deletes the stored menu; the default applies again.
    Reset,
    /// Prints the state directory that would be used (if any).
    StatePath,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::StatePath => {
            if let Some(path) = cli.state_dir.or_else(config::resolve_state_dir) {
                println!("{}", path.display());
            }
        }
        Command::Show => {
            let store = open_store(cli.state_dir)?;
            let json =
                serde_json::to_string_pretty(&store.load()).context("serialize menu config")?;
            println!("{json}");
        }
        Command::Preview { tab } => {
            let store = open_store(cli.state_dir)?;
            let notifier = ChangeNotifier::new();
            let mut preview = LivePreview::mount(store.reader(), &notifier);
            if let Some(tab) = tab {
                if !preview.select_tab(tab) {
                    bail!("This menu has no tabs; '{tab}' cannot be shown separately");
                }
            }
            print!("{}", preview.render());
        }
        Command::Export { tab } => {
            let store = open_store(cli.state_dir)?;
            let config = store.load();
            let definition = export::definition_for_tab(&config, tab.unwrap_or(config.active_tab));
            let json = serde_json::to_string_pretty(&definition).context("serialize definition")?;
            println!("{json}");
        }
        Command::Publish => {
            let editor = mount_editor(cli.state_dir)?;
            let definitions = editor.publish_menu();
            let json =
                serde_json::to_string_pretty(&definitions).context("serialize definitions")?;
            println!("{json}");
            eprintln!("publishing is not connected to a messaging backend; nothing was sent");
        }
        Command::Reset => {
            let store = open_store(cli.state_dir)?;
            store.clear().context("reset menu")?;
        }
        Command::Template { id } => {
            let template = Template::parse_known(&id)?;
            edit(cli.state_dir, |editor| editor.set_template(template))?;
        }
        Command::Tabs { state } => {
            edit(cli.state_dir, |editor| {
                editor.set_use_tabs(matches!(state, Switch::On))
            })?;
        }
        Command::Tab { tab } => {
            edit(cli.state_dir, |editor| editor.set_active_tab(tab))?;
        }
        Command::Rotate => {
            edit(cli.state_dir, |editor| editor.toggle_rotation())?;
        }
        Command::Slot {
            key,
            kind,
            label,
            value,
        } => {
            let action = SlotAction::new(kind, label, value);
            edit(cli.state_dir, |editor| editor.set_slot(key, action))?;
        }
        Command::ClearSlot { key } => {
            edit(cli.state_dir, |editor| editor.clear_slot(key))?;
        }
        Command::Seed => {
            edit(cli.state_dir, |editor| editor.replace(MenuConfig::sample()))?;
        }
    }

    Ok(())
}

fn open_store(state_dir: Option<PathBuf>) -> Result<ConfigStore> {
    let storage = storage::open(state_dir).context("open menu storage")?;
    Ok(ConfigStore::new(storage))
}

fn mount_editor(state_dir: Option<PathBuf>) -> Result<MenuEditor> {
    let store = open_store(state_dir)?;
    Ok(MenuEditor::mount(store, ChangeNotifier::new()))
}

fn edit(
    state_dir: Option<PathBuf>,
    change: impl FnOnce(&mut MenuEditor) -> Result<EditorUpdate>,
) -> Result<()> {
    let mut editor = mount_editor(state_dir)?;
    let update = change(&mut editor)?;
    if !update.published {
        eprintln!("no change");
    }
    Ok(())
}
