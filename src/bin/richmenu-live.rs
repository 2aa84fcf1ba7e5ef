use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    rc::Rc,
};

use anyhow::{Context, Result};
use clap::Parser;

use richmenu::{
    logging,
    menu::commands::{self, Command, HELP},
    storage::{self, KvStorage, MemoryStorage},
    ChangeNotifier, ConfigStore, LivePreview, MenuEditor,
};

/// Interactive designer: one editor and one preview in the same process,
/// connected only through the persisted menu and the change signal.
#[derive(Parser, Debug)]
#[command(name = "richmenu-live", version)]
struct Args {
    /// Directory holding the persisted menu.
    #[arg(long, conflicts_with = "in_memory")]
    state_dir: Option<PathBuf>,

    /// Keep the menu in memory only.
    #[arg(long)]
    in_memory: bool,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let storage: Rc<dyn KvStorage> = if args.in_memory {
        Rc::new(MemoryStorage::new())
    } else {
        storage::open(args.state_dir).context("open menu storage")?
    };

    let store = ConfigStore::new(storage);
    let notifier = ChangeNotifier::new();
    let mut preview = LivePreview::mount(store.reader(), &notifier);
    let mut editor = MenuEditor::mount(store, notifier);

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    writeln!(out, "{}", editor.render())?;
    writeln!(out, "{}", preview.render())?;
    preview.take_refresh();

    prompt(&mut out)?;
    for line in stdin.lock().lines() {
        let line = line.context("read command")?;
        let cmd = match commands::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => {
                prompt(&mut out)?;
                continue;
            }
            Err(e) => {
                writeln!(out, "error: {e:#}")?;
                prompt(&mut out)?;
                continue;
            }
        };

        match cmd {
            Command::Edit(edit) => {
                let update = editor.handle(edit);
                if update.published || update.refresh_form || update.refresh_status {
                    writeln!(out, "{}", editor.render())?;
                }
            }
            Command::View(tab) => {
                if !preview.select_tab(tab) {
                    writeln!(out, "this menu has no tabs")?;
                }
            }
            Command::Press(index) => match preview.press(index) {
                Ok(message) => writeln!(out, "{message}")?,
                Err(e) => writeln!(out, "error: {e:#}")?,
            },
            Command::Show => {
                writeln!(out, "{}", editor.render())?;
                writeln!(out, "{}", preview.render())?;
                preview.take_refresh();
            }
            Command::Publish => {
                let definitions = editor.publish_menu();
                let json = serde_json::to_string_pretty(&definitions)
                    .context("serialize definitions")?;
                writeln!(out, "{json}")?;
                writeln!(out, "(not sent: no messaging backend is configured)")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }

        if preview.take_refresh() {
            writeln!(out, "{}", preview.render())?;
        }
        prompt(&mut out)?;
    }

    preview.unmount();
    Ok(())
}

fn prompt(out: &mut impl Write) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}
