use ratatui::layout::Rect;
use tracing::debug;
use tui_textarea::TextArea;

use crate::catalog::Catalog;
use crate::client::SubmitReceipt;
use crate::config::FormConfig;
use crate::map::{Coordinate, MapViewport};
use crate::report::{FaultReport, FaultType, Field, FieldError, FormState};

/// Which control has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Description,
    FaultType,
    Region,
    Ward,
    Map,
    Submit,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Description => Focus::FaultType,
            Focus::FaultType => Focus::Region,
            Focus::Region => Focus::Ward,
            Focus::Ward => Focus::Map,
            Focus::Map => Focus::Submit,
            Focus::Submit => Focus::Description,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Description => Focus::Submit,
            Focus::FaultType => Focus::Description,
            Focus::Region => Focus::FaultType,
            Focus::Ward => Focus::Region,
            Focus::Map => Focus::Ward,
            Focus::Submit => Focus::Map,
        }
    }
}

/// Lifecycle of the single outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    InFlight,
    Succeeded { status: u16 },
    Failed(String),
}

/// Full application state: the form being composed plus UI state around it.
pub struct App {
    catalog: Catalog,
    settings: FormConfig,
    pub form: FormState,
    /// Ward choices for the selected region.
    wards: Vec<String>,
    pub viewport: MapViewport,
    pub description_input: TextArea<'static>,
    pub focus: Focus,
    pub field_errors: Vec<FieldError>,
    pub submit_state: SubmitState,
    /// Flash message (error or success), cleared on next keypress.
    pub flash: Option<String>,
    pub show_keybindings: bool,
    pub should_quit: bool,
    /// Inner area of the map pane from the last draw, used for mouse hit-testing.
    pub map_area: Rect,
    pub tile_url: String,
}

impl App {
    pub fn new(catalog: Catalog, settings: FormConfig, tile_url: String) -> Self {
        Self {
            catalog,
            settings,
            form: FormState::default(),
            wards: Vec::new(),
            viewport: MapViewport::default(),
            description_input: new_description_input(""),
            focus: Focus::Description,
            field_errors: Vec::new(),
            submit_state: SubmitState::Idle,
            flash: None,
            show_keybindings: false,
            should_quit: false,
            map_area: Rect::default(),
            tile_url,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn wards(&self) -> &[String] {
        &self.wards
    }

    pub fn require_location(&self) -> bool {
        self.settings.require_location
    }

    /// Assign a scalar field. Returns false when the value was rejected.
    pub fn on_field_change(&mut self, field: Field, value: &str) -> bool {
        match field {
            Field::Description => {
                self.form.description = value.to_string();
                if self.description_input.lines().join("\n") != value {
                    self.description_input = new_description_input(value);
                }
            }
            Field::FaultType => match FaultType::from_str(value) {
                Some(t) => self.form.fault_type = Some(t),
                None => return false,
            },
            Field::Region => return self.on_region_change(value),
            Field::Ward => return self.on_ward_change(value),
            Field::Location => return false,
        }
        self.clear_error(field);
        true
    }

    /// Select a region and cascade: clear the ward, swap the ward list, move
    /// the map. Unknown names leave everything untouched.
    pub fn on_region_change(&mut self, name: &str) -> bool {
        let Some(region) = self.catalog.find(name) else {
            return false;
        };
        self.form.region = region.name.clone();
        self.form.ward.clear();
        self.wards = region.wards.clone();
        self.viewport = MapViewport {
            center: region.center,
            zoom: region.zoom,
        };
        debug!(region = %self.form.region, wards = self.wards.len(), "region selected");
        self.clear_error(Field::Region);
        true
    }

    /// Select a ward of the current region. Names outside the current ward
    /// list are rejected.
    pub fn on_ward_change(&mut self, name: &str) -> bool {
        let known = self
            .catalog
            .find(&self.form.region)
            .is_some_and(|r| r.has_ward(name));
        if !known {
            return false;
        }
        self.form.ward = name.to_string();
        self.clear_error(Field::Ward);
        true
    }

    /// Record the clicked point, replacing any earlier one.
    pub fn on_map_click(&mut self, coordinate: Coordinate) {
        self.form.location = Some(coordinate);
        debug!(lat = coordinate.lat, lng = coordinate.lng, "location captured");
        self.clear_error(Field::Location);
    }

    /// Translate a mouse click on the screen into a map click.
    pub fn click_map_cell(&mut self, column: u16, row: u16) -> bool {
        match self.viewport.coordinate_at(self.map_area, column, row) {
            Some(coordinate) => {
                self.focus = Focus::Map;
                self.on_map_click(coordinate);
                true
            }
            None => false,
        }
    }

    /// Keyboard equivalent of clicking the crosshair at the map center.
    pub fn click_map_center(&mut self) {
        self.on_map_click(self.viewport.center);
    }

    pub fn pan_map(&mut self, dx: i32, dy: i32) {
        self.viewport = self.viewport.panned(dx, dy);
    }

    pub fn zoom_map(&mut self, delta: i8) {
        self.viewport = self.viewport.zoomed(delta);
    }

    pub fn validate(&self) -> Vec<FieldError> {
        self.form.validate(self.settings.require_location)
    }

    pub fn is_submitting(&self) -> bool {
        self.submit_state == SubmitState::InFlight
    }

    /// Validate and move to `InFlight`, returning the payload to send. Returns
    /// `None` while a request is already running or when fields are missing.
    pub fn begin_submit(&mut self) -> Option<FaultReport> {
        if self.is_submitting() {
            self.flash = Some("A report is already being submitted".to_string());
            return None;
        }

        let errors = self.validate();
        if !errors.is_empty() {
            let fields = errors
                .iter()
                .map(|e| e.field.label())
                .collect::<Vec<_>>()
                .join(", ");
            self.flash = Some(format!("Missing: {}", fields));
            self.field_errors = errors;
            return None;
        }

        self.field_errors.clear();
        self.submit_state = SubmitState::InFlight;
        self.flash = Some("Submitting report...".to_string());
        Some(self.form.to_report())
    }

    /// Record the outcome of the request started by `begin_submit`.
    pub fn finish_submit(&mut self, result: Result<SubmitReceipt, String>) {
        if !self.is_submitting() {
            return;
        }
        match result {
            Ok(receipt) => {
                if self.settings.reset_after_submit {
                    self.reset_form();
                }
                self.submit_state = SubmitState::Succeeded {
                    status: receipt.status,
                };
                self.flash = Some(format!("Report submitted (HTTP {})", receipt.status));
            }
            Err(e) => {
                self.flash = Some(format!("Submit failed: {}. Press Ctrl+S to retry.", e));
                self.submit_state = SubmitState::Failed(e);
            }
        }
    }

    /// Discard the current report and start over.
    pub fn reset(&mut self) {
        if self.is_submitting() {
            return;
        }
        self.reset_form();
        self.submit_state = SubmitState::Idle;
    }

    fn reset_form(&mut self) {
        self.form = FormState::default();
        self.wards.clear();
        self.viewport = MapViewport::default();
        self.description_input = new_description_input("");
        self.field_errors.clear();
        self.focus = Focus::Description;
    }

    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn clear_error(&mut self, field: Field) {
        self.field_errors.retain(|e| e.field != field);
    }

    /// Copy the text area contents into the form after an edit.
    pub fn sync_description(&mut self) {
        let text = self.description_input.lines().join("\n");
        if text != self.form.description {
            self.on_field_change(Field::Description, &text);
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Move the selection of the focused picker by `delta` entries.
    pub fn step_picker(&mut self, delta: i32) {
        match self.focus {
            Focus::FaultType => {
                let options = FaultType::all();
                let current = self
                    .form
                    .fault_type
                    .and_then(|t| options.iter().position(|o| *o == t));
                if let Some(i) = step_index(current, delta, options.len()) {
                    self.on_field_change(Field::FaultType, options[i].as_str());
                }
            }
            Focus::Region => {
                let names = self.catalog.names();
                let current = names.iter().position(|n| *n == self.form.region);
                if let Some(i) = step_index(current, delta, names.len()) {
                    if current != Some(i) {
                        self.on_region_change(&names[i]);
                    }
                }
            }
            Focus::Ward => {
                let current = self.wards.iter().position(|w| *w == self.form.ward);
                if let Some(i) = step_index(current, delta, self.wards.len()) {
                    let ward = self.wards[i].clone();
                    self.on_ward_change(&ward);
                }
            }
            Focus::Description | Focus::Map | Focus::Submit => {}
        }
    }

    pub fn toggle_keybindings(&mut self) {
        self.show_keybindings = !self.show_keybindings;
    }

    pub fn close_keybindings(&mut self) {
        self.show_keybindings = false;
    }
}

fn new_description_input(text: &str) -> TextArea<'static> {
    let lines: Vec<String> = text.split('\n').map(|l| l.to_string()).collect();
    let mut input = TextArea::new(lines);
    input.set_cursor_line_style(ratatui::style::Style::default());
    input.set_placeholder_text("What is wrong?");
    input
}

/// Next picker index. An empty selection starts at the first entry.
fn step_index(current: Option<usize>, delta: i32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match current {
        None => Some(0),
        Some(i) => Some((i as i64 + delta as i64).clamp(0, len as i64 - 1) as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Region;
    use crate::map::DEFAULT_TILE_URL;
    use crate::report::ReportLocation;
    use serde_json::json;

    fn app_with(settings: FormConfig) -> App {
        App::new(Catalog::tanzania(), settings, DEFAULT_TILE_URL.to_string())
    }

    fn app() -> App {
        app_with(FormConfig::default())
    }

    fn fill(app: &mut App) {
        assert!(app.on_field_change(Field::Description, "No power since morning"));
        assert!(app.on_field_change(Field::FaultType, "Power Outage"));
        assert!(app.on_region_change("Dar es Salaam"));
        assert!(app.on_ward_change("Ilala"));
    }

    #[test]
    fn new_app_starts_empty_with_country_view() {
        let app = app();
        assert!(app.form.is_empty());
        assert!(app.wards().is_empty());
        assert_eq!(app.viewport, MapViewport::tanzania());
        assert_eq!(app.submit_state, SubmitState::Idle);
        assert_eq!(app.focus, Focus::Description);
    }

    #[test]
    fn region_change_cascades_for_every_region() {
        let mut app = app();
        let regions = app.catalog().regions().to_vec();
        for region in &regions {
            app.form.ward = "stale".to_string();
            assert!(app.on_region_change(&region.name));
            assert_eq!(app.form.region, region.name);
            assert_eq!(app.form.ward, "");
            assert_eq!(app.wards(), region.wards.as_slice());
            assert_eq!(
                app.viewport,
                MapViewport {
                    center: region.center,
                    zoom: region.zoom
                }
            );
        }
    }

    #[test]
    fn unknown_region_is_a_no_op() {
        let mut app = app();
        fill(&mut app);
        let form_before = app.form.clone();
        let wards_before = app.wards().to_vec();
        let viewport_before = app.viewport;

        assert!(!app.on_region_change("NonexistentRegion"));
        assert_eq!(app.form, form_before);
        assert_eq!(app.wards(), wards_before.as_slice());
        assert_eq!(app.viewport, viewport_before);
    }

    #[test]
    fn switching_regions_never_keeps_a_stale_ward() {
        let mut app = app();
        assert!(app.on_region_change("Arusha"));
        assert!(app.on_ward_change("Meru"));
        assert!(app.on_region_change("Kilimanjaro"));
        assert_eq!(app.form.ward, "");
        assert!(!app.wards().iter().any(|w| w == "Meru"));
        assert!(!app.on_ward_change("Meru"));
        assert_eq!(app.form.ward, "");
    }

    #[test]
    fn ward_change_requires_a_region() {
        let mut app = app();
        assert!(!app.on_ward_change("Ilala"));
        assert_eq!(app.form.ward, "");
    }

    #[test]
    fn last_map_click_wins() {
        let mut app = app();
        app.on_map_click(Coordinate { lat: -6.8, lng: 39.28 });
        app.on_map_click(Coordinate { lat: -3.39, lng: 36.68 });
        assert_eq!(app.form.location, Some(Coordinate { lat: -3.39, lng: 36.68 }));
    }

    #[test]
    fn end_to_end_payload_matches_form() {
        let mut app = app();
        fill(&mut app);
        assert!(app.wards().iter().any(|w| w == "Ilala"));
        app.on_map_click(Coordinate { lat: -6.8, lng: 39.28 });

        let report = app.begin_submit().expect("valid form");
        assert_eq!(
            serde_json::to_value(&report).expect("serialize"),
            json!({
                "description": "No power since morning",
                "faultType": "Power Outage",
                "region": "Dar es Salaam",
                "ward": "Ilala",
                "location": { "lng": 39.28, "lat": -6.8 }
            })
        );
        assert_eq!(app.submit_state, SubmitState::InFlight);
    }

    #[test]
    fn submit_without_click_sends_null_location() {
        let mut app = app();
        fill(&mut app);
        let report = app.begin_submit().expect("location optional by default");
        assert_eq!(report.location, ReportLocation { lng: None, lat: None });
    }

    #[test]
    fn submit_requires_click_when_configured() {
        let mut app = app_with(FormConfig {
            require_location: true,
            reset_after_submit: true,
        });
        fill(&mut app);
        assert!(app.begin_submit().is_none());
        assert!(app.error_for(Field::Location).is_some());
        assert_eq!(app.submit_state, SubmitState::Idle);

        app.on_map_click(Coordinate { lat: -6.8, lng: 39.28 });
        assert!(app.error_for(Field::Location).is_none());
        assert!(app.begin_submit().is_some());
    }

    #[test]
    fn invalid_form_reports_field_errors() {
        let mut app = app();
        assert!(app.begin_submit().is_none());
        assert_eq!(app.field_errors.len(), 4);
        assert_eq!(
            app.flash.as_deref(),
            Some("Missing: Description, Fault type, Region, Ward")
        );

        app.on_field_change(Field::Description, "Sparks");
        assert!(app.error_for(Field::Description).is_none());
        assert!(app.error_for(Field::Ward).is_some());
    }

    #[test]
    fn second_submit_is_refused_while_in_flight() {
        let mut app = app();
        fill(&mut app);
        assert!(app.begin_submit().is_some());
        assert!(app.begin_submit().is_none());
        assert_eq!(app.submit_state, SubmitState::InFlight);
    }

    #[test]
    fn success_resets_form_and_viewport() {
        let mut app = app();
        fill(&mut app);
        app.on_map_click(Coordinate { lat: -6.8, lng: 39.28 });
        app.begin_submit().expect("payload");

        app.finish_submit(Ok(SubmitReceipt { status: 201 }));
        assert_eq!(app.submit_state, SubmitState::Succeeded { status: 201 });
        assert!(app.form.is_empty());
        assert!(app.wards().is_empty());
        assert_eq!(app.viewport, MapViewport::tanzania());
        assert!(app.description_input.lines().join("").is_empty());
        assert_eq!(app.flash.as_deref(), Some("Report submitted (HTTP 201)"));
    }

    #[test]
    fn success_keeps_form_when_reset_disabled() {
        let mut app = app_with(FormConfig {
            require_location: false,
            reset_after_submit: false,
        });
        fill(&mut app);
        app.begin_submit().expect("payload");
        app.finish_submit(Ok(SubmitReceipt { status: 200 }));
        assert_eq!(app.form.ward, "Ilala");
        assert_eq!(app.submit_state, SubmitState::Succeeded { status: 200 });
    }

    #[test]
    fn failure_keeps_form_and_allows_retry() {
        let mut app = app();
        fill(&mut app);
        app.begin_submit().expect("payload");

        app.finish_submit(Err("connection refused".to_string()));
        assert_eq!(
            app.submit_state,
            SubmitState::Failed("connection refused".to_string())
        );
        assert_eq!(app.form.region, "Dar es Salaam");
        assert!(app.flash.as_deref().unwrap_or_default().contains("retry"));
        assert!(app.begin_submit().is_some());
    }

    #[test]
    fn stray_result_without_request_is_ignored() {
        let mut app = app();
        app.finish_submit(Ok(SubmitReceipt { status: 201 }));
        assert_eq!(app.submit_state, SubmitState::Idle);
    }

    #[test]
    fn unknown_fault_type_is_rejected() {
        let mut app = app();
        assert!(!app.on_field_change(Field::FaultType, "Volcano"));
        assert_eq!(app.form.fault_type, None);
    }

    #[test]
    fn description_change_updates_text_area() {
        let mut app = app();
        app.on_field_change(Field::Description, "line one\nline two");
        assert_eq!(app.description_input.lines(), ["line one", "line two"]);

        app.description_input.insert_str("!");
        app.sync_description();
        assert_eq!(app.form.description, "!line one\nline two");
    }

    #[test]
    fn pickers_step_through_options_and_cascade() {
        let mut app = app();
        app.focus = Focus::FaultType;
        app.step_picker(1);
        assert_eq!(app.form.fault_type, Some(FaultType::MeterProblem));
        app.step_picker(3);
        assert_eq!(app.form.fault_type, Some(FaultType::PowerOutage));
        app.step_picker(10);
        assert_eq!(app.form.fault_type, Some(FaultType::Other));

        app.focus = Focus::Ward;
        app.step_picker(1);
        assert_eq!(app.form.ward, "");

        app.focus = Focus::Region;
        app.step_picker(1);
        assert_eq!(app.form.region, "Dar es Salaam");
        app.step_picker(1);
        assert_eq!(app.form.region, "Arusha");
        assert_eq!(app.viewport.zoom, 10);

        app.focus = Focus::Ward;
        app.step_picker(1);
        assert_eq!(app.form.ward, "Arusha Urban");
        app.step_picker(-1);
        assert_eq!(app.form.ward, "Arusha Urban");
    }

    #[test]
    fn mouse_click_inside_map_area_records_location() {
        let mut app = app();
        app.map_area = Rect::new(40, 1, 41, 21);
        assert!(app.click_map_cell(60, 11));
        let location = app.form.location.expect("recorded");
        assert!((location.lat - app.viewport.center.lat).abs() < 1e-9);
        assert!((location.lng - app.viewport.center.lng).abs() < 1e-9);
        assert_eq!(app.focus, Focus::Map);

        assert!(!app.click_map_cell(5, 5));
        assert_eq!(app.form.location, Some(location));
    }

    #[test]
    fn keyboard_click_uses_viewport_center() {
        let mut app = app();
        app.on_region_change("Mwanza");
        app.pan_map(4, 0);
        app.click_map_center();
        assert_eq!(app.form.location, Some(app.viewport.center));
        assert!(app.viewport.center.lng > 32.917);
    }

    #[test]
    fn injected_catalog_drives_the_cascade() {
        let catalog = Catalog::from_regions(vec![Region {
            name: "Pwani".to_string(),
            wards: vec!["Kibaha".to_string()],
            center: Coordinate { lat: -7.3, lng: 38.8 },
            zoom: 9,
        }])
        .expect("catalog");
        let mut app = App::new(catalog, FormConfig::default(), DEFAULT_TILE_URL.to_string());
        assert!(!app.on_region_change("Dar es Salaam"));
        assert!(app.on_region_change("Pwani"));
        assert_eq!(app.wards(), ["Kibaha".to_string()]);
        assert_eq!(app.viewport.zoom, 9);
    }

    #[test]
    fn reset_is_refused_while_in_flight() {
        let mut app = app();
        fill(&mut app);
        app.begin_submit().expect("payload");
        app.reset();
        assert_eq!(app.form.region, "Dar es Salaam");

        app.finish_submit(Err("timeout".to_string()));
        app.reset();
        assert!(app.form.is_empty());
        assert_eq!(app.submit_state, SubmitState::Idle);
    }

    #[test]
    fn focus_cycles_both_directions() {
        let mut app = app();
        for _ in 0..6 {
            app.next_focus();
        }
        assert_eq!(app.focus, Focus::Description);
        app.prev_focus();
        assert_eq!(app.focus, Focus::Submit);
    }
}
