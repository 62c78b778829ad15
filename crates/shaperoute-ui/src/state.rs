//! Session state owned by the orchestrator.

use shaperoute_core::{NoticeEvent, Position, RouteRequest, RouteResult, Shape, Viewport};
use shaperoute_settings::Config;

/// Everything the views render from.
///
/// Only [`Orchestrator`](crate::Orchestrator) mutates this; views get a
/// shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub viewport: Viewport,
    pub selected_point: Option<Position>,
    pub shapes: Vec<Shape>,
    /// True once the shape list request has completed, successfully or not.
    pub shapes_loaded: bool,
    pub selected_shape_id: Option<String>,
    pub target_distance_km: f64,
    pub generation_in_flight: bool,
    pub search_in_flight: bool,
    pub download_in_flight: bool,
    pub last_route: Option<RouteResult>,
    /// Bumped every time `last_route` is replaced.
    pub route_revision: u64,
    /// Blocking notice shown until dismissed.
    pub notice: Option<NoticeEvent>,
}

impl SessionState {
    pub fn new(config: &Config) -> Self {
        Self {
            viewport: Viewport::new(config.map.default_center, config.map.default_zoom),
            selected_point: None,
            shapes: Vec::new(),
            shapes_loaded: false,
            selected_shape_id: None,
            target_distance_km: config.route.default_distance_km,
            generation_in_flight: false,
            search_in_flight: false,
            download_in_flight: false,
            last_route: None,
            route_revision: 0,
            notice: None,
        }
    }

    fn shape_id(&self) -> Option<&str> {
        self.selected_shape_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Point chosen, shape chosen, and nothing generating.
    pub fn can_generate(&self) -> bool {
        self.selected_point.is_some() && self.shape_id().is_some() && !self.generation_in_flight
    }

    /// Request built from the current form values, when complete.
    pub fn current_request(&self) -> Option<RouteRequest> {
        let start = self.selected_point?;
        let shape_id = self.shape_id()?;
        Some(RouteRequest::new(shape_id, start, self.target_distance_km))
    }

    pub fn has_shape(&self, id: &str) -> bool {
        self.shapes.iter().any(|s| s.id == id)
    }
}
