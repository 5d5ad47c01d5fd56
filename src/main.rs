mod app;
mod catalog;
mod client;
mod config;
mod map;
mod report;
mod telemetry;
mod widgets;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use app::{App, Focus, SubmitState};
use client::{ReportClient, SubmitReceipt};
use report::FaultReport;

enum BackgroundMessage {
    ReportSubmitted(std::result::Result<SubmitReceipt, String>),
}

fn spawn_submit(tx: &UnboundedSender<BackgroundMessage>, client: ReportClient, report: FaultReport) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client
            .submit(&report)
            .await
            .map_err(|e| format!("{:#}", e));
        if let Err(ref e) = result {
            warn!(error = %e, "fault report submission failed");
        }
        let _ = tx.send(BackgroundMessage::ReportSubmitted(result));
    });
}

fn submit(app: &mut App, client: &ReportClient, bg_tx: &UnboundedSender<BackgroundMessage>) {
    if let Some(report) = app.begin_submit() {
        info!(region = %report.region, ward = %report.ward, fault_type = report.fault_type.as_str(), "submitting fault report");
        spawn_submit(bg_tx, client.clone(), report);
    }
}

/// Command-line overrides for the config file.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    endpoint: Option<String>,
}

impl CliArgs {
    fn apply(&self, config: &mut config::AppConfig) {
        if let Some(ref catalog) = self.catalog {
            config.catalog = Some(catalog.clone());
        }
        if let Some(ref endpoint) = self.endpoint {
            config.server.base_url = endpoint.clone();
        }
    }
}

/// Returns `Ok(None)` when help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>> {
    let mut parsed = CliArgs::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| match iter.next() {
            Some(v) => Ok(v),
            None => Err(anyhow::anyhow!("{} expects a value", flag)),
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--catalog" => parsed.catalog = Some(PathBuf::from(value("--catalog")?)),
            "--endpoint" => parsed.endpoint = Some(value("--endpoint")?),
            "--help" | "-h" => return Ok(None),
            other => bail!("Unknown argument: {} (try --help)", other),
        }
    }

    Ok(Some(parsed))
}

fn print_help() {
    println!("faultreport: report a utility fault to the TANESCO backend");
    println!("  --config PATH     Config file (default ~/.config/faultreport/config.toml)");
    println!("  --catalog PATH    Region catalog (.yml, .yaml or .csv)");
    println!("  --endpoint URL    Backend base URL (reports go to URL/api/fault-reports/)");
    println!("  -h, --help        Show this help");
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        print_help();
        return Ok(());
    };

    let config_path = match args.config {
        Some(ref path) => path.clone(),
        None => config::config_path()?,
    };
    let mut config = config::load_config(&config_path)?.unwrap_or_default();
    args.apply(&mut config);

    let log_warning = telemetry::log_path()
        .and_then(|path| telemetry::init(&path, &config.log_level))
        .err()
        .map(|e| format!("Logging disabled: {:#}", e));

    let catalog = match config.catalog {
        Some(ref path) => catalog::load_catalog(path)?,
        None => catalog::Catalog::tanzania(),
    };
    let client = ReportClient::new(&config.server)?;
    info!(regions = catalog.len(), endpoint = client.endpoint(), "starting faultreport");

    let mut app = App::new(catalog, config.form.clone(), config.map.tile_url.clone());
    app.flash = log_warning;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (bg_tx, bg_rx) = tokio::sync::mpsc::unbounded_channel();
    let result = run(&mut terminal, &mut app, &client, &bg_tx, bg_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ReportClient,
    bg_tx: &UnboundedSender<BackgroundMessage>,
    mut bg_rx: UnboundedReceiver<BackgroundMessage>,
) -> Result<()> {
    loop {
        while let Ok(message) = bg_rx.try_recv() {
            match message {
                BackgroundMessage::ReportSubmitted(result) => app.finish_submit(result),
            }
        }

        let completed = terminal.draw(|f| ui(f, app))?;
        app.map_area = widgets::map_inner(completed.area);

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Clear flash on any keypress
                    app.flash = None;
                    handle_key(app, key, client, bg_tx);
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut ratatui::Frame, app: &App) {
    use ratatui::style::{Color, Style};
    use ratatui::text::{Line, Span};

    let panes = widgets::panes(f.area());
    widgets::report_form::render(f, panes.form, app);
    widgets::map_pane::render(f, panes.map, app);

    // Status bar
    let status_text = if let Some(ref flash) = app.flash {
        let color = match app.submit_state {
            SubmitState::InFlight => Color::Yellow,
            SubmitState::Failed(_) => Color::Red,
            _ if !app.field_errors.is_empty() => Color::Red,
            _ => Color::Green,
        };
        Span::styled(flash.as_str(), Style::default().fg(color))
    } else if app.is_submitting() {
        Span::styled(" Submitting report...", Style::default().fg(Color::Yellow))
    } else {
        let hints = match app.focus {
            Focus::Description => " Type the description  Esc/Tab: next field  Ctrl+S: submit  Ctrl+C: quit ",
            Focus::FaultType | Focus::Region | Focus::Ward => {
                " Up/Down: choose  Tab: next field  Ctrl+S: submit  ?: keys  q: quit "
            }
            Focus::Map => " Click or Enter: mark location  arrows: pan  +/-: zoom  o: browser  ?: keys ",
            Focus::Submit => " Enter: submit report  Tab: next field  Ctrl+R: clear  ?: keys  q: quit ",
        };
        Span::styled(hints, Style::default().fg(Color::DarkGray))
    };
    f.render_widget(
        ratatui::widgets::Paragraph::new(Line::from(status_text)),
        panes.status,
    );

    if app.show_keybindings {
        widgets::keybindings_help::render(f);
    }
}

fn handle_key(
    app: &mut App,
    key: KeyEvent,
    client: &ReportClient,
    bg_tx: &UnboundedSender<BackgroundMessage>,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('s') => {
                submit(app, client, bg_tx);
                return;
            }
            KeyCode::Char('r') => {
                if app.is_submitting() {
                    app.flash = Some("Wait for the current submission to finish".to_string());
                } else if !app.form.is_empty() {
                    app.reset();
                    app.flash = Some("Form cleared".to_string());
                }
                return;
            }
            _ => {}
        }
    }

    if app.show_keybindings {
        handle_keybindings_keys(app, key.code);
        return;
    }

    match key.code {
        KeyCode::F(1) => {
            app.toggle_keybindings();
            return;
        }
        KeyCode::Tab => {
            app.next_focus();
            return;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Description => handle_description_keys(app, key),
        Focus::FaultType | Focus::Region | Focus::Ward => handle_picker_keys(app, key.code),
        Focus::Map => handle_map_keys(app, key.code),
        Focus::Submit => handle_submit_keys(app, key.code, client, bg_tx),
    }
}

fn handle_keybindings_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1) => {
            app.close_keybindings()
        }
        _ => {}
    }
}

fn handle_description_keys(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.next_focus();
        return;
    }
    app.description_input.input(key);
    app.sync_description();
}

fn handle_picker_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.toggle_keybindings(),
        KeyCode::Char('j') | KeyCode::Down => app.step_picker(1),
        KeyCode::Char('k') | KeyCode::Up => app.step_picker(-1),
        KeyCode::Enter => app.next_focus(),
        _ => {}
    }
}

fn handle_map_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.toggle_keybindings(),
        KeyCode::Char('h') | KeyCode::Left => app.pan_map(-4, 0),
        KeyCode::Char('l') | KeyCode::Right => app.pan_map(4, 0),
        KeyCode::Char('k') | KeyCode::Up => app.pan_map(0, -2),
        KeyCode::Char('j') | KeyCode::Down => app.pan_map(0, 2),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_map(1),
        KeyCode::Char('-') => app.zoom_map(-1),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.click_map_center();
            flash_location(app);
        }
        KeyCode::Char('o') => {
            let url = map::browse_url(&app.viewport, app.form.location);
            let opener = if cfg!(target_os = "macos") {
                "open"
            } else {
                "xdg-open"
            };
            if let Err(e) = std::process::Command::new(opener).arg(&url).spawn() {
                app.flash = Some(format!("Could not open browser: {}", e));
            }
        }
        _ => {}
    }
}

fn handle_submit_keys(
    app: &mut App,
    key: KeyCode,
    client: &ReportClient,
    bg_tx: &UnboundedSender<BackgroundMessage>,
) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.toggle_keybindings(),
        KeyCode::Enter | KeyCode::Char(' ') => submit(app, client, bg_tx),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_keybindings {
        return;
    }
    let over_map = app
        .viewport
        .coordinate_at(app.map_area, mouse.column, mouse.row)
        .is_some();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.click_map_cell(mouse.column, mouse.row) {
                flash_location(app);
            }
        }
        MouseEventKind::ScrollUp if over_map => app.zoom_map(1),
        MouseEventKind::ScrollDown if over_map => app.zoom_map(-1),
        _ => {}
    }
}

fn flash_location(app: &mut App) {
    if let Some(c) = app.form.location {
        app.flash = Some(format!("Location set: {:.5}, {:.5}", c.lat, c.lng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_reads_overrides() {
        let parsed = parse_args(args(&[
            "--config",
            "/tmp/fr.toml",
            "--catalog",
            "regions.csv",
            "--endpoint",
            "https://faults.example.org",
        ]))
        .expect("parse")
        .expect("not help");
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/fr.toml")));
        assert_eq!(parsed.catalog, Some(PathBuf::from("regions.csv")));
        assert_eq!(parsed.endpoint.as_deref(), Some("https://faults.example.org"));

        let mut config = config::AppConfig::default();
        parsed.apply(&mut config);
        assert_eq!(config.server.base_url, "https://faults.example.org");
        assert_eq!(config.catalog, Some(PathBuf::from("regions.csv")));
    }

    #[test]
    fn parse_args_help_and_errors() {
        assert!(parse_args(args(&["-h"])).expect("parse").is_none());
        assert_eq!(
            parse_args(args(&[])).expect("parse"),
            Some(CliArgs::default())
        );
        let err = parse_args(args(&["--endpoint"])).expect_err("missing value");
        assert!(err.to_string().contains("--endpoint expects a value"));
        let err = parse_args(args(&["--bogus"])).expect_err("unknown");
        assert!(err.to_string().contains("Unknown argument: --bogus"));
    }
}
