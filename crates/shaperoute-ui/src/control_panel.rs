//! Control panel view model.
//!
//! Renders the form from [`SessionState`] and turns user input into
//! [`Message`]s. The only state kept here is the location search text.

use crate::message::Message;
use crate::state::SessionState;
use shaperoute_settings::RouteSettings;

pub const GENERATE_LABEL: &str = "GENERATE ROUTE";
pub const GENERATING_LABEL: &str = "GENERATING...";
pub const SEARCH_LABEL: &str = "SEARCH";
pub const SEARCHING_LABEL: &str = "...";
pub const DOWNLOAD_LABEL: &str = "DOWNLOAD GPX";
pub const DOWNLOADING_LABEL: &str = "DOWNLOADING...";
pub const SHAPE_PLACEHOLDER: &str = "Loading shapes...";
pub const START_POINT_HINT: &str = "Click on map or search location";

/// Bounded, stepped distance selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    pub min_km: f64,
    pub max_km: f64,
    pub step_km: f64,
}

impl DistanceRange {
    pub fn new(settings: &RouteSettings) -> Self {
        Self {
            min_km: settings.min_distance_km,
            max_km: settings.max_distance_km,
            step_km: settings.step_km,
        }
    }

    /// Clamp `km` into range and snap it to the nearest step.
    pub fn normalize(&self, km: f64) -> f64 {
        if !km.is_finite() {
            return self.min_km;
        }
        let clamped = km.clamp(self.min_km, self.max_km);
        let steps = ((clamped - self.min_km) / self.step_km).round();
        (self.min_km + steps * self.step_km).min(self.max_km)
    }
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self::new(&RouteSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Everything the panel displays.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub start_point_label: String,
    pub search_text: String,
    pub search_label: &'static str,
    pub search_enabled: bool,
    pub distance_label: String,
    pub distance_km: f64,
    pub distance_range: DistanceRange,
    pub shape_header: String,
    pub shape_options: Vec<ShapeOption>,
    pub shape_selector_enabled: bool,
    /// Shown instead of options while the list is empty.
    pub shape_placeholder: Option<&'static str>,
    pub generate_label: &'static str,
    pub generate_enabled: bool,
    pub download_visible: bool,
    pub download_label: &'static str,
    pub route_distance_label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    query: String,
    range: DistanceRange,
}

impl ControlPanel {
    pub fn new(settings: &RouteSettings) -> Self {
        Self {
            query: String::new(),
            range: DistanceRange::new(settings),
        }
    }

    pub fn range(&self) -> DistanceRange {
        self.range
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn can_submit_search(&self, state: &SessionState) -> bool {
        !self.query.trim().is_empty() && !state.search_in_flight
    }

    /// Submit the search box; `None` when the submit is ignored.
    pub fn submit_search(&self, state: &SessionState) -> Option<Message> {
        self.can_submit_search(state)
            .then(|| Message::LocationSearchSubmitted(self.query.trim().to_string()))
    }

    /// Every change goes up immediately, already clamped and snapped.
    pub fn change_distance(&self, km: f64) -> Message {
        Message::DistanceChanged(self.range.normalize(km))
    }

    pub fn select_shape(&self, state: &SessionState, id: &str) -> Option<Message> {
        if id.is_empty() || state.shapes.is_empty() {
            return None;
        }
        Some(Message::ShapeSelected(id.to_string()))
    }

    pub fn generate(&self, state: &SessionState) -> Option<Message> {
        state.can_generate().then_some(Message::GenerateRequested)
    }

    pub fn download(&self, state: &SessionState) -> Option<Message> {
        (state.last_route.is_some() && !state.download_in_flight)
            .then_some(Message::DownloadRequested)
    }

    pub fn view(&self, state: &SessionState) -> PanelView {
        let selected = state.selected_shape_id.as_deref();
        let shape_options = state
            .shapes
            .iter()
            .map(|shape| ShapeOption {
                id: shape.id.clone(),
                label: shape.display_label(),
                selected: selected == Some(shape.id.as_str()),
            })
            .collect();

        PanelView {
            start_point_label: start_point_label(state),
            search_text: self.query.clone(),
            search_label: if state.search_in_flight {
                SEARCHING_LABEL
            } else {
                SEARCH_LABEL
            },
            search_enabled: self.can_submit_search(state),
            distance_label: format!("DISTANCE: {} KM", js_number(state.target_distance_km)),
            distance_km: state.target_distance_km,
            distance_range: self.range,
            shape_header: format!("SHAPE ({} available)", state.shapes.len()),
            shape_options,
            shape_selector_enabled: !state.shapes.is_empty(),
            shape_placeholder: state.shapes.is_empty().then_some(SHAPE_PLACEHOLDER),
            generate_label: if state.generation_in_flight {
                GENERATING_LABEL
            } else {
                GENERATE_LABEL
            },
            generate_enabled: state.can_generate(),
            download_visible: state.last_route.is_some(),
            download_label: if state.download_in_flight {
                DOWNLOADING_LABEL
            } else {
                DOWNLOAD_LABEL
            },
            route_distance_label: state
                .last_route
                .as_ref()
                .map(|route| route_distance_label(route.distance_meters)),
        }
    }
}

pub fn start_point_label(state: &SessionState) -> String {
    match state.selected_point {
        Some(point) => format!("{:.4}, {:.4}", point.lat, point.lon),
        None => START_POINT_HINT.to_string(),
    }
}

/// `5234.7` -> `"5.23 km"`
pub fn route_distance_label(distance_meters: f64) -> String {
    format!("{:.2} km", distance_meters / 1000.0)
}

/// `"star_01"`, `5234.7` -> `"star_01_5.2347km.gpx"`
pub fn track_file_name(shape_id: &str, distance_meters: f64) -> String {
    format!("{}_{}km.gpx", shape_id, js_number(distance_meters / 1000.0))
}

/// Shortest decimal that round-trips, with exponents only outside
/// `[1e-6, 1e21)` in the `1e-7` / `1e+21` style.
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}
