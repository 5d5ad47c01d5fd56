use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders};

use crate::app::{App, Focus};
use crate::map;

pub fn block(app: &App) -> Block<'static> {
    let focused = app.focus == Focus::Map;
    let v = app.viewport;
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(Span::styled(
            format!(" Map  z{}  {:.4}, {:.4} ", v.zoom, v.center.lat, v.center.lng),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            format!(" {}  (c) OpenStreetMap ", map::center_tile_url(&app.tile_url, &v)),
            Style::default().fg(Color::DarkGray),
        )))
}

/// Inner drawing area for a map pane occupying `area`.
pub fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

pub fn render(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = block(app);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bounds = app.viewport.bounds(inner.width, inner.height);
    let center = app.viewport.center;
    let marker = app.form.location;
    let show_crosshair = app.focus == Focus::Map;
    let region_labels: Vec<(f64, f64, String, bool)> = app
        .catalog()
        .regions()
        .iter()
        .filter(|r| bounds.contains(r.center))
        .map(|r| (r.center.lng, r.center.lat, r.name.clone(), r.name == app.form.region))
        .collect();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([bounds.west, bounds.east])
        .y_bounds([bounds.south, bounds.north])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            for (x, y, name, selected) in &region_labels {
                let color = if *selected { Color::Yellow } else { Color::Gray };
                ctx.draw(&Points {
                    coords: &[(*x, *y)],
                    color,
                });
                ctx.print(*x, *y, Span::styled(format!(" {}", name), Style::default().fg(color)));
            }

            if show_crosshair {
                ctx.print(center.lng, center.lat, Span::styled("+", Style::default().fg(Color::Cyan)));
            }

            if let Some(m) = marker {
                ctx.print(
                    m.lng,
                    m.lat,
                    Span::styled(
                        "X",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });
    f.render_widget(canvas, inner);
}
