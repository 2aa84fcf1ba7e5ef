use anyhow::{anyhow, bail, Context, Result};

use crate::menu::model::{ActionKind, TabId, Template};

/// One field of the selected slot's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotField {
    Kind(ActionKind),
    Label(String),
    Value(String),
}

/// Changes the editor applies to its draft. Everything except `Select`
/// persists and notifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Template(Template),
    UseTabs(bool),
    ActiveTab(TabId),
    ToggleRotation,
    /// Zero-based slot index.
    Select(usize),
    SetField(SlotField),
    ClearSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(EditCommand),
    /// Switch the preview's own displayed tab.
    View(TabId),
    /// Zero-based slot index pressed in the preview.
    Press(usize),
    Show,
    Publish,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  template <grid-3x2|large-1>   pick the menu template
  tabs <on|off>                 split the menu into two tabs
  tab <tab1|tab2>               tab being edited
  rotate                        flip the large-1 orientation
  select <n>                    button to edit (1-based)
  type <web|tel|text>           action type of the selected button
  label <text>                  caption of the selected button
  value <text>                  URL, phone number or message text
  clear                         remove the selected button's action
  view <tab1|tab2>              tab shown in the preview
  press <n>                     tap a button in the preview (1-based)
  show                          print editor and preview
  publish                       export the menu (not sent anywhere)
  help | quit";

/// Parses one session line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let cmd = match word {
        "template" => Command::Edit(EditCommand::Template(Template::parse_known(
            required(word, rest)?,
        )?)),
        "tabs" => Command::Edit(EditCommand::UseTabs(parse_switch(required(word, rest)?)?)),
        "tab" => Command::Edit(EditCommand::ActiveTab(required(word, rest)?.parse()?)),
        "rotate" => Command::Edit(EditCommand::ToggleRotation),
        "select" => Command::Edit(EditCommand::Select(parse_button(required(word, rest)?)?)),
        "type" => Command::Edit(EditCommand::SetField(SlotField::Kind(
            required(word, rest)?.parse()?,
        ))),
        "label" => Command::Edit(EditCommand::SetField(SlotField::Label(rest.to_string()))),
        "value" => Command::Edit(EditCommand::SetField(SlotField::Value(rest.to_string()))),
        "clear" => Command::Edit(EditCommand::ClearSlot),
        "view" => Command::View(required(word, rest)?.parse()?),
        "press" => Command::Press(parse_button(required(word, rest)?)?),
        "show" => Command::Show,
        "publish" => Command::Publish,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("Unknown command '{other}'. Type 'help' for the list."),
    };
    Ok(Some(cmd))
}

fn required<'a>(word: &str, rest: &'a str) -> Result<&'a str> {
    if rest.is_empty() {
        return Err(anyhow!("'{word}' needs an argument. Type 'help' for usage."));
    }
    Ok(rest)
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => bail!("Expected on or off, got '{other}'"),
    }
}

fn parse_button(value: &str) -> Result<usize> {
    let n = value
        .parse::<usize>()
        .with_context(|| format!("Invalid button number '{value}'"))?;
    if n == 0 {
        bail!("Button numbers start at 1");
    }
    Ok(n - 1)
}
