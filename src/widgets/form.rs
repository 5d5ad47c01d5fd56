use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn render_modal_frame(
    f: &mut ratatui::Frame,
    title: &str,
    percent_x: u16,
    percent_y: u16,
) -> Rect {
    let area = centered_rect(percent_x, percent_y, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

pub fn label_style(focused: bool) -> Style {
    Style::default().fg(if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    })
}

/// Render a select-style picker. Unfocused it collapses to the chosen value;
/// focused it lists every option with the selection highlighted.
pub fn render_picker(
    lines: &mut Vec<Line>,
    label: &str,
    options: &[String],
    selected: Option<usize>,
    focused: bool,
    placeholder: &str,
) {
    let current = selected
        .and_then(|i| options.get(i))
        .map(|s| s.as_str());

    lines.push(Line::from(vec![
        Span::styled(format!("{}: ", label), label_style(focused)),
        match current {
            Some(value) => Span::styled(
                value.to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)),
        },
    ]));

    if !focused {
        return;
    }
    for (i, option) in options.iter().enumerate() {
        let is_selected = Some(i) == selected;
        let prefix = if is_selected { "> " } else { "  " };
        let style = if is_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(
            format!("  {}{}", prefix, option),
            style,
        )));
    }
}

/// Render a validation message under a field, if any.
pub fn render_error(lines: &mut Vec<Line>, error: Option<&str>) {
    if let Some(message) = error {
        lines.push(Line::from(Span::styled(
            format!("  ! {}", message),
            Style::default().fg(Color::Red),
        )));
    }
}

pub fn render_button(lines: &mut Vec<Line>, label: &str, focused: bool, enabled: bool) {
    let style = if !enabled {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    lines.push(Line::from(Span::styled(format!("[ {} ]", label), style)));
}
