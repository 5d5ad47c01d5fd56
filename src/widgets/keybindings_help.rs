use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::form;

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

pub fn render(f: &mut ratatui::Frame) {
    let inner = form::render_modal_frame(f, "Keybindings", 60, 70);

    let lines = vec![
        heading("Form"),
        Line::from("  Tab / Shift+Tab: next / previous field"),
        Line::from("  Up / Down or j / k: change fault type, region or ward"),
        Line::from("  Enter on Report Fault or Ctrl+S: submit"),
        Line::from("  Ctrl+R: clear the form"),
        Line::from(""),
        heading("Description"),
        Line::from("  Type freely, Enter adds a new line"),
        Line::from("  Esc: leave the text box"),
        Line::from(""),
        heading("Map"),
        Line::from("  Left click: mark the fault location"),
        Line::from("  Arrows or h / j / k / l: pan"),
        Line::from("  + / -: zoom in / out"),
        Line::from("  Enter or Space: mark the location under the crosshair"),
        Line::from("  o: open the view in a browser"),
        Line::from(""),
        heading("General"),
        Line::from("  ? or F1: toggle this help"),
        Line::from("  q (outside the text box) or Ctrl+C: quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let body = Paragraph::new(lines).block(Block::default());
    f.render_widget(body, inner);
}
