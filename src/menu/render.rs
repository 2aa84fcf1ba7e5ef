use unicode_width::UnicodeWidthChar;

use crate::{
    layout::SlotPlacement,
    menu::{
        common,
        model::{MenuConfig, TabId},
    },
};

const CELL_WIDTH: usize = 18;
const CELL_HEIGHT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub placement: SlotPlacement,
    pub icon: &'static str,
    pub label: String,
    pub selected: bool,
}

/// One tab of a menu laid out through the shared layout resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub columns: u16,
    pub rows: u16,
    pub cells: Vec<CellView>,
}

impl GridView {
    pub fn build(config: &MenuConfig, tab: TabId, selected: Option<usize>) -> Self {
        let geometry = config.geometry();
        let cells = geometry
            .slots
            .iter()
            .map(|placement| {
                let action = config.slot(tab, placement.index);
                CellView {
                    placement: *placement,
                    icon: common::action_icon(action.map(|a| a.kind)),
                    label: common::slot_display_label(action, placement.index),
                    selected: selected == Some(placement.index),
                }
            })
            .collect();

        Self {
            columns: geometry.columns,
            rows: geometry.rows,
            cells,
        }
    }

    pub fn placements(&self) -> Vec<SlotPlacement> {
        self.cells.iter().map(|cell| cell.placement).collect()
    }

    pub fn spanning_slot(&self) -> Option<usize> {
        self.cells
            .iter()
            .find(|cell| cell.placement.is_spanning())
            .map(|cell| cell.placement.index)
    }

    pub fn render(&self) -> String {
        let columns = usize::from(self.columns);
        let rows = usize::from(self.rows);
        let mut canvas = Canvas::new(
            columns * (CELL_WIDTH + 1) + 1,
            rows * (CELL_HEIGHT + 1) + 1,
        );

        for cell in &self.cells {
            let p = cell.placement;
            let x0 = usize::from(p.column) * (CELL_WIDTH + 1);
            let x1 = usize::from(p.column + p.column_span) * (CELL_WIDTH + 1);
            let y0 = usize::from(p.row) * (CELL_HEIGHT + 1);
            let y1 = usize::from(p.row + p.row_span) * (CELL_HEIGHT + 1);
            canvas.frame(x0, y0, x1, y1);

            let mid = (y0 + y1) / 2;
            let label = if cell.selected {
                format!("[{}]", cell.label)
            } else {
                cell.label.clone()
            };
            canvas.centered(x0, x1, mid - 1, &format!("({})", cell.icon));
            canvas.centered(x0, x1, mid, &label);
        }

        canvas.into_string()
    }
}

/// Tab bar with the current tab in brackets, e.g. `| [Menu A] |  Menu B  |`.
pub fn render_tab_bar(current: TabId) -> String {
    let mut out = String::from("|");
    for tab in TabId::ALL {
        let label = common::tab_short_label(tab);
        if tab == current {
            out.push_str(&format!(" [{label}] |"));
        } else {
            out.push_str(&format!("  {label}  |"));
        }
    }
    out
}

// Second column of a double-width glyph; dropped when the canvas is printed.
const WIDE_TAIL: char = '\0';

struct Canvas {
    width: usize,
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            cells: vec![vec![' '; width]; height],
        }
    }

    fn line(&mut self, y: usize, x: usize, ch: char) {
        let Some(slot) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return;
        };
        if *slot != '+' {
            *slot = ch;
        }
    }

    fn frame(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) {
        for x in x0..=x1 {
            self.line(y0, x, '-');
            self.line(y1, x, '-');
        }
        for y in y0..=y1 {
            self.line(y, x0, '|');
            self.line(y, x1, '|');
        }
        for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
            if let Some(slot) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
                *slot = '+';
            }
        }
    }

    /// Centers `text` by display width; wide glyphs take two columns.
    fn centered(&mut self, x0: usize, x1: usize, y: usize, text: &str) {
        let inner = x1.saturating_sub(x0 + 1);
        let mut glyphs = Vec::new();
        let mut used = 0;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if used + width > inner {
                break;
            }
            glyphs.push((ch, width));
            used += width;
        }
        let Some(row) = self.cells.get_mut(y) else {
            return;
        };
        let mut x = x0 + 1 + (inner - used) / 2;
        for (ch, width) in glyphs {
            for (offset, fill) in std::iter::once(ch)
                .chain(std::iter::repeat(WIDE_TAIL).take(width - 1))
                .enumerate()
            {
                if let Some(slot) = row.get_mut(x + offset) {
                    *slot = fill;
                }
            }
            x += width;
        }
    }

    fn into_string(self) -> String {
        let width = self.width;
        self.cells
            .into_iter()
            .map(|row| {
                debug_assert_eq!(row.len(), width);
                row.into_iter()
                    .filter(|&ch| ch != WIDE_TAIL)
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::{ActionKind, SlotAction, SlotKey, Template};
    use pretty_assertions::assert_eq;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn builds_cells_from_slots_of_the_given_tab() {
        let mut config = MenuConfig::default();
        config.slots.insert(
            SlotKey::new(TabId::Tab2, 1),
            SlotAction::new(ActionKind::Tel, "Call", "03"),
        );

        let tab1 = GridView::build(&config, TabId::Tab1, None);
        assert_eq!(tab1.cells[1].label, "Btn 2");
        assert_eq!(tab1.cells[1].icon, "smart_button");

        let tab2 = GridView::build(&config, TabId::Tab2, Some(1));
        assert_eq!(tab2.cells[1].label, "Call");
        assert_eq!(tab2.cells[1].icon, "call");
        assert!(tab2.cells[1].selected);
        assert!(!tab2.cells[0].selected);
    }

    #[test]
    fn renders_landscape_large_menu() {
        let mut config = MenuConfig {
            template: Template::Large1,
            ..MenuConfig::default()
        };
        config.slots.insert(
            SlotKey::new(TabId::Tab1, 0),
            SlotAction::new(ActionKind::Web, "Book", "https://example.com"),
        );

        let rendered = GridView::build(&config, TabId::Tab1, Some(2)).render();
        let expected = [
            "+-------------------------------------+",
            "|              (public)               |",
            "|                Book                 |",
            "|                                     |",
            "+------------------+------------------+",
            "|  (smart_button)  |  (smart_button)  |",
            "|      Btn 2       |     [Btn 3]      |",
            "|                  |                  |",
            "+------------------+------------------+",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn wide_labels_keep_the_frame_aligned() {
        let mut config = MenuConfig::default();
        config.slots.insert(
            SlotKey::new(TabId::Tab1, 0),
            SlotAction::new(ActionKind::Web, "予約サイト", "https://example.com"),
        );
        config.slots.insert(
            SlotKey::new(TabId::Tab1, 1),
            SlotAction::new(ActionKind::Tel, "お電話でのご予約はこちら", "03"),
        );

        let rendered = GridView::build(&config, TabId::Tab1, None).render();
        assert!(rendered.contains("|    予約サイト    |"));
        for line in rendered.lines() {
            assert_eq!(UnicodeWidthStr::width(line), 3 * (CELL_WIDTH + 1) + 1, "{line}");
        }
    }

    #[test]
    fn tab_bar_brackets_current_tab() {
        assert_eq!(render_tab_bar(TabId::Tab2), "|  Menu A  | [Menu B] |");
    }
}
