use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::form;
use crate::app::{App, Focus, SubmitState};
use crate::report::{FaultType, Field};

const DESCRIPTION_HEIGHT: u16 = 6;

pub fn render(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            " TANESCO Fault Report ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(DESCRIPTION_HEIGHT),
            Constraint::Min(0),
        ])
        .split(inner);

    let focused = app.focus == Focus::Description;
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Description:",
            form::label_style(focused),
        ))),
        sections[0],
    );

    let description_block = Block::default()
        .borders(Borders::ALL)
        .border_style(form::label_style(focused));
    let description_inner = description_block.inner(sections[1]);
    f.render_widget(description_block, sections[1]);
    f.render_widget(&app.description_input, description_inner);

    let body = Paragraph::new(field_lines(app)).wrap(Wrap { trim: false });
    f.render_widget(body, sections[2]);
}

fn field_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    form::render_error(&mut lines, app.error_for(Field::Description));
    lines.push(Line::from(""));

    let fault_types: Vec<String> = FaultType::all().iter().map(|t| t.as_str().to_string()).collect();
    let fault_idx = app
        .form
        .fault_type
        .and_then(|t| FaultType::all().iter().position(|o| *o == t));
    form::render_picker(
        &mut lines,
        "Fault type",
        &fault_types,
        fault_idx,
        app.focus == Focus::FaultType,
        "Select Fault Type",
    );
    form::render_error(&mut lines, app.error_for(Field::FaultType));
    lines.push(Line::from(""));

    let regions = app.catalog().names();
    let region_idx = regions.iter().position(|r| *r == app.form.region);
    form::render_picker(
        &mut lines,
        "Region",
        &regions,
        region_idx,
        app.focus == Focus::Region,
        "Select Region",
    );
    form::render_error(&mut lines, app.error_for(Field::Region));
    lines.push(Line::from(""));

    let wards = app.wards();
    let ward_idx = wards.iter().position(|w| *w == app.form.ward);
    let ward_placeholder = if wards.is_empty() {
        "Pick a region first"
    } else {
        "Select Ward"
    };
    form::render_picker(
        &mut lines,
        "Ward",
        wards,
        ward_idx,
        app.focus == Focus::Ward,
        ward_placeholder,
    );
    form::render_error(&mut lines, app.error_for(Field::Ward));
    lines.push(Line::from(""));

    let location_label = if app.require_location() {
        "Location: "
    } else {
        "Location (optional): "
    };
    lines.push(Line::from(vec![
        Span::styled(location_label, form::label_style(app.focus == Focus::Map)),
        match app.form.location {
            Some(c) => Span::styled(
                format!("{:.5}, {:.5}", c.lat, c.lng),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("click the map", Style::default().fg(Color::DarkGray)),
        },
    ]));
    form::render_error(&mut lines, app.error_for(Field::Location));
    lines.push(Line::from(""));

    let submitting = app.is_submitting();
    let label = if submitting {
        "Submitting..."
    } else {
        "Report Fault"
    };
    form::render_button(&mut lines, label, app.focus == Focus::Submit, !submitting);

    match &app.submit_state {
        SubmitState::Succeeded { status } => lines.push(Line::from(Span::styled(
            format!("Last report accepted (HTTP {})", status),
            Style::default().fg(Color::Green),
        ))),
        SubmitState::Failed(e) => lines.push(Line::from(Span::styled(
            format!("Last attempt failed: {}", e),
            Style::default().fg(Color::Red),
        ))),
        SubmitState::Idle | SubmitState::InFlight => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Tab] next field  [Ctrl+S] submit  [?] keys",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}
