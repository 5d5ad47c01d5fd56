pub mod form;
pub mod keybindings_help;
pub mod map_pane;
pub mod report_form;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

const FORM_PANE_WIDTH: u16 = 44;

/// Screen split: form on the left, map filling the rest, status bar below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub form: Rect,
    pub map: Rect,
    pub status: Rect,
}

pub fn panes(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_PANE_WIDTH), Constraint::Min(0)])
        .split(rows[0]);
    Panes {
        form: columns[0],
        map: columns[1],
        status: rows[1],
    }
}

/// Drawing area of the map for a frame of size `area`.
pub fn map_inner(area: Rect) -> Rect {
    map_pane::inner(panes(area).map)
}
