use serde::Serialize;

use crate::menu::model::Template;

/// Canvas the messaging platform expects for a full-height rich menu.
pub const CANVAS_WIDTH: u32 = 2500;
pub const CANVAS_HEIGHT: u32 = 1686;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlacement {
    pub index: usize,
    pub row: u16,
    pub column: u16,
    pub row_span: u16,
    pub column_span: u16,
}

impl SlotPlacement {
    fn cell(index: usize, row: u16, column: u16) -> Self {
        Self {
            index,
            row,
            column,
            row_span: 1,
            column_span: 1,
        }
    }

    pub fn is_spanning(&self) -> bool {
        self.row_span > 1 || self.column_span > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AreaBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid shape shared by the editable grid and the preview grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGeometry {
    pub columns: u16,
    pub rows: u16,
    /// Ordered by slot index.
    pub slots: Vec<SlotPlacement>,
}

impl LayoutGeometry {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn spanning_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .find(|slot| slot.is_spanning())
            .map(|slot| slot.index)
    }

    pub fn placement(&self, index: usize) -> Option<&SlotPlacement> {
        self.slots.get(index)
    }

    /// Pixel bounds of every slot on a `width` x `height` canvas.
    ///
    /// Track edges are rounded down, so the areas tile the canvas with no gaps.
    pub fn areas(&self, width: u32, height: u32) -> Vec<AreaBounds> {
        let columns = u32::from(self.columns);
        let rows = u32::from(self.rows);
        let column_edge = |c: u32| width * c / columns;
        let row_edge = |r: u32| height * r / rows;

        self.slots
            .iter()
            .map(|slot| {
                let c0 = u32::from(slot.column);
                let c1 = c0 + u32::from(slot.column_span);
                let r0 = u32::from(slot.row);
                let r1 = r0 + u32::from(slot.row_span);
                AreaBounds {
                    x: column_edge(c0),
                    y: row_edge(r0),
                    width: column_edge(c1) - column_edge(c0),
                    height: row_edge(r1) - row_edge(r0),
                }
            })
            .collect()
    }
}

/// Maps a template and orientation to its grid. Unknown templates get the
/// `grid-3x2` shape.
pub fn resolve_layout(template: &Template, is_rotated: bool) -> LayoutGeometry {
    match template {
        Template::Large1 if is_rotated => LayoutGeometry {
            columns: 2,
            rows: 2,
            slots: vec![
                SlotPlacement {
                    row_span: 2,
                    ..SlotPlacement::cell(0, 0, 0)
                },
                SlotPlacement::cell(1, 0, 1),
                SlotPlacement::cell(2, 1, 1),
            ],
        },
        Template::Large1 => LayoutGeometry {
            columns: 2,
            rows: 2,
            slots: vec![
                SlotPlacement {
                    column_span: 2,
                    ..SlotPlacement::cell(0, 0, 0)
                },
                SlotPlacement::cell(1, 1, 0),
                SlotPlacement::cell(2, 1, 1),
            ],
        },
        Template::Grid3x2 | Template::Other(_) => grid_3x2(),
    }
}

fn grid_3x2() -> LayoutGeometry {
    let slots = (0..6u16)
        .map(|i| SlotPlacement::cell(usize::from(i), i / 3, i % 3))
        .collect();
    LayoutGeometry {
        columns: 3,
        rows: 2,
        slots,
    }
}
