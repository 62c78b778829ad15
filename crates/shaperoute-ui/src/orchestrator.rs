//! Application state orchestrator.
//!
//! A reducer over [`Message`]s. It owns the [`SessionState`] and the
//! [`MapSurface`], decides which effects to run, and reports every state
//! change on the [`EventBus`]. It performs no I/O itself; the returned
//! [`Command`]s are executed by the [`Runtime`](crate::Runtime).
//!
//! Generation and geocode completions carry the sequence number of the
//! request that produced them. Only the latest issued request may touch
//! state; older completions are logged and dropped.

use crate::control_panel::{track_file_name, DistanceRange};
use crate::map_surface::MapSurface;
use crate::message::{Command, Message};
use crate::state::SessionState;
use shaperoute_core::{
    AppEvent, ClientError, DownloadEvent, EventBus, GenerationEvent, NoticeEvent, Position,
    RouteResult, SaveError, SessionEvent, Shape,
};
use shaperoute_settings::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SHAPES_FAILED_NOTICE: &str =
    "Failed to load shapes. Make sure the backend is running.";
pub const LOCATION_NOT_FOUND_NOTICE: &str =
    "Location not found. Try another search term (e.g., \"Paris, France\")";
pub const SEARCH_FAILED_NOTICE: &str = "Error searching for location. Please try again.";
pub const GENERATION_FAILED_NOTICE: &str =
    "Failed to generate route. Please try a different location or shape.";
pub const DOWNLOAD_FAILED_NOTICE: &str = "Failed to download GPX file.";
pub const SAVE_CANCELLED_NOTICE: &str = "No file was saved.";

pub struct Orchestrator {
    state: SessionState,
    map: MapSurface,
    range: DistanceRange,
    search_zoom: f64,
    events: Arc<EventBus>,
    started: bool,
    generation_seq: u64,
    search_seq: u64,
}

impl Orchestrator {
    pub fn new(config: &Config, events: Arc<EventBus>) -> Self {
        Self {
            state: SessionState::new(config),
            map: MapSurface::new(&config.map),
            range: DistanceRange::new(&config.route),
            search_zoom: config.map.search_zoom,
            events,
            started: false,
            generation_seq: 0,
            search_seq: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Sequence number of the latest generation request
    pub fn generation_seq(&self) -> u64 {
        self.generation_seq
    }

    /// Apply one message and return the effects it requires.
    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::Started => self.start(),
            Message::PointPicked(position) => {
                self.select_point(position);
                Vec::new()
            }
            Message::LocationSearchSubmitted(query) => self.submit_search(query),
            Message::ShapeSelected(id) => {
                self.select_shape(id);
                Vec::new()
            }
            Message::DistanceChanged(km) => {
                self.change_distance(km);
                Vec::new()
            }
            Message::GenerateRequested => self.request_generation(),
            Message::DownloadRequested => self.request_download(),
            Message::NoticeDismissed => {
                self.state.notice = None;
                Vec::new()
            }
            Message::ShapesLoaded(result) => {
                self.shapes_loaded(result);
                Vec::new()
            }
            Message::LocationResolved { seq, result } => {
                self.location_resolved(seq, result);
                Vec::new()
            }
            Message::RouteGenerated { seq, result } => {
                self.route_generated(seq, result);
                Vec::new()
            }
            Message::TrackDownloaded { file_name, result } => {
                self.track_downloaded(file_name, result)
            }
            Message::TrackSaved { bytes, result } => {
                self.track_saved(bytes, result);
                Vec::new()
            }
        }
    }

    fn publish(&self, event: AppEvent) {
        // Nobody listening is fine for a headless session.
        let _ = self.events.publish(event);
    }

    fn raise(&mut self, notice: NoticeEvent) {
        self.publish(AppEvent::Notice(notice.clone()));
        self.state.notice = Some(notice);
    }

    fn start(&mut self) -> Vec<Command> {
        if self.started {
            debug!("Already started; shape list is not refetched");
            return Vec::new();
        }
        self.started = true;
        info!("Session started, fetching shapes");
        vec![Command::LoadShapes]
    }

    fn shapes_loaded(&mut self, result: Result<Vec<Shape>, ClientError>) {
        self.state.shapes_loaded = true;
        match result {
            Ok(shapes) => {
                info!("Loaded {} shapes", shapes.len());
                self.state.shapes = shapes;
                self.publish(AppEvent::Session(SessionEvent::ShapesLoaded {
                    count: self.state.shapes.len(),
                }));
                if self.state.selected_shape_id.is_none() {
                    if let Some(first) = self.state.shapes.first() {
                        let id = first.id.clone();
                        self.select_shape(id);
                    }
                }
            }
            Err(e) => {
                error!("Error loading shapes: {}", e);
                self.raise(NoticeEvent::error(SHAPES_FAILED_NOTICE));
            }
        }
    }

    fn select_point(&mut self, position: Position) {
        self.state.selected_point = Some(position);
        self.publish(AppEvent::Session(SessionEvent::PointSelected { position }));
    }

    fn select_shape(&mut self, id: String) {
        if !self.state.has_shape(&id) {
            warn!("Ignoring unknown shape '{}'", id);
            return;
        }
        self.state.selected_shape_id = Some(id.clone());
        self.publish(AppEvent::Session(SessionEvent::ShapeSelected { shape_id: id }));
    }

    fn change_distance(&mut self, km: f64) {
        let km = self.range.normalize(km);
        self.state.target_distance_km = km;
        self.publish(AppEvent::Session(SessionEvent::DistanceChanged { km }));
    }

    fn submit_search(&mut self, query: String) -> Vec<Command> {
        let query = query.trim();
        if query.is_empty() || self.state.search_in_flight {
            debug!("Search submit ignored");
            return Vec::new();
        }
        self.search_seq += 1;
        self.state.search_in_flight = true;
        vec![Command::Geocode {
            seq: self.search_seq,
            query: query.to_string(),
        }]
    }

    fn location_resolved(&mut self, seq: u64, result: Result<Position, ClientError>) {
        if seq != self.search_seq {
            debug!("Dropping stale geocode #{} (latest #{})", seq, self.search_seq);
            return;
        }
        self.state.search_in_flight = false;
        match result {
            Ok(position) => {
                self.select_point(position);
                let viewport = self.map.recenter(position, self.search_zoom);
                self.state.viewport = viewport;
                self.publish(AppEvent::Session(SessionEvent::ViewportChanged { viewport }));
            }
            Err(e @ ClientError::Lookup { .. }) => {
                warn!("{}", e);
                self.raise(NoticeEvent::error(LOCATION_NOT_FOUND_NOTICE));
            }
            Err(e) => {
                error!("Geocoding error: {}", e);
                self.raise(NoticeEvent::error(SEARCH_FAILED_NOTICE));
            }
        }
    }

    fn request_generation(&mut self) -> Vec<Command> {
        if !self.state.can_generate() {
            debug!("Generate ignored: form incomplete or generation running");
            return Vec::new();
        }
        let Some(request) = self.state.current_request() else {
            return Vec::new();
        };

        self.generation_seq += 1;
        self.state.generation_in_flight = true;
        self.publish(AppEvent::Generation(GenerationEvent::Started {
            seq: self.generation_seq,
            request: request.clone(),
        }));
        vec![Command::GenerateRoute {
            seq: self.generation_seq,
            request,
        }]
    }

    fn route_generated(&mut self, seq: u64, result: Result<RouteResult, ClientError>) {
        if seq != self.generation_seq {
            warn!("Dropping stale route #{} (latest #{})", seq, self.generation_seq);
            self.publish(AppEvent::Generation(GenerationEvent::StaleDiscarded {
                seq,
                latest: self.generation_seq,
            }));
            return;
        }
        self.state.generation_in_flight = false;

        match result.and_then(check_route) {
            Ok(route) => {
                info!(
                    "Route #{}: {} points, {:.0} m",
                    seq,
                    route.coordinates.len(),
                    route.distance_meters
                );
                self.publish(AppEvent::Generation(GenerationEvent::Succeeded {
                    seq,
                    distance_m: route.distance_meters,
                    points: route.coordinates.len(),
                }));
                self.state.last_route = Some(route);
                self.state.route_revision += 1;

                if let Some(viewport) = self
                    .map
                    .sync_route(self.state.last_route.as_ref(), self.state.route_revision)
                {
                    self.state.viewport = viewport;
                    self.publish(AppEvent::Session(SessionEvent::ViewportChanged { viewport }));
                }
            }
            Err(e) => {
                error!("Error generating route: {}", e);
                self.publish(AppEvent::Generation(GenerationEvent::Failed {
                    seq,
                    error: e.to_string(),
                }));
                self.raise(NoticeEvent::error(GENERATION_FAILED_NOTICE));
            }
        }
    }

    fn request_download(&mut self) -> Vec<Command> {
        if self.state.download_in_flight {
            debug!("Download already running");
            return Vec::new();
        }
        let Some(route) = self.state.last_route.as_ref() else {
            debug!("Download ignored: no route yet");
            return Vec::new();
        };
        // The payload is regenerated from what the form shows now.
        let Some(request) = self.state.current_request() else {
            return Vec::new();
        };

        let file_name = track_file_name(&request.shape_id, route.distance_meters);
        self.state.download_in_flight = true;
        self.publish(AppEvent::Download(DownloadEvent::Started {
            file_name: file_name.clone(),
        }));
        vec![Command::DownloadTrack { file_name, request }]
    }

    fn track_downloaded(
        &mut self,
        file_name: String,
        result: Result<Vec<u8>, ClientError>,
    ) -> Vec<Command> {
        match result {
            Ok(bytes) => vec![Command::SaveTrack { file_name, bytes }],
            Err(e) => {
                error!("Error downloading GPX: {}", e);
                self.state.download_in_flight = false;
                self.publish(AppEvent::Download(DownloadEvent::Failed {
                    error: e.to_string(),
                }));
                self.raise(NoticeEvent::error(DOWNLOAD_FAILED_NOTICE));
                Vec::new()
            }
        }
    }

    fn track_saved(&mut self, bytes: usize, result: Result<PathBuf, SaveError>) {
        self.state.download_in_flight = false;
        match result {
            Ok(path) => {
                info!("Saved track to {}", path.display());
                self.publish(AppEvent::Download(DownloadEvent::Saved {
                    path: path.clone(),
                    bytes,
                }));
                self.raise(NoticeEvent::info(format!("Saved {}", path.display())));
            }
            // Also what a missing file chooser looks like.
            Err(SaveError::Cancelled) => {
                info!("Track save cancelled, nothing written");
                self.raise(NoticeEvent::info(SAVE_CANCELLED_NOTICE));
            }
            Err(e) => {
                error!("{}", e);
                self.publish(AppEvent::Download(DownloadEvent::Failed {
                    error: e.to_string(),
                }));
                self.raise(NoticeEvent::error(e.to_string()));
            }
        }
    }
}

/// A usable route has at least one vertex and a finite, non-negative length.
fn check_route(route: RouteResult) -> Result<RouteResult, ClientError> {
    if route.is_empty() {
        return Err(ClientError::protocol("backend returned an empty route"));
    }
    if !route.distance_meters.is_finite() || route.distance_meters < 0.0 {
        return Err(ClientError::protocol(format!(
            "backend returned an invalid distance: {}",
            route.distance_meters
        )));
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_surface::GeoBounds;
    use shaperoute_core::{thread_safe_vec, EventCategory, EventFilter, NoticeLevel, RouteRequest};

    fn shape(id: &str) -> Shape {
        Shape {
            id: id.to_string(),
            name: id.to_string(),
            source_file_name: format!("{}.svg", id),
            point_count: 50,
            normalized_length: 1.0,
        }
    }

    fn route(shape_id: &str) -> RouteResult {
        RouteResult {
            coordinates: vec![
                (48.8566, 2.3522),
                (48.8700, 2.3300),
                (48.8810, 2.3650),
                (48.8566, 2.3522),
            ],
            distance_meters: 5234.7,
            shape_id: shape_id.to_string(),
            start: Position::new(48.8566, 2.3522),
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(&Config::default(), Arc::new(EventBus::new()))
    }

    /// Started, shapes loaded, point picked.
    fn ready() -> Orchestrator {
        let mut orch = orchestrator();
        orch.update(Message::Started);
        orch.update(Message::ShapesLoaded(Ok(vec![shape("star_01"), shape("heart_02")])));
        orch.update(Message::PointPicked(Position::new(48.8566, 2.3522)));
        orch
    }

    fn generate_seq(commands: &[Command]) -> u64 {
        match commands {
            [Command::GenerateRoute { seq, .. }] => *seq,
            other => panic!("expected one GenerateRoute, got {:?}", other),
        }
    }

    #[test]
    fn test_shapes_requested_once() {
        let mut orch = orchestrator();
        assert_eq!(orch.update(Message::Started), vec![Command::LoadShapes]);
        assert!(orch.update(Message::Started).is_empty());
    }

    #[test]
    fn test_first_shape_auto_selected() {
        let orch = ready();
        assert_eq!(orch.state().selected_shape_id.as_deref(), Some("star_01"));
        assert!(orch.state().shapes_loaded);
    }

    #[test]
    fn test_empty_shape_list_selects_nothing() {
        let mut orch = orchestrator();
        orch.update(Message::Started);
        orch.update(Message::ShapesLoaded(Ok(Vec::new())));
        assert!(orch.state().selected_shape_id.is_none());
        assert!(orch.state().notice.is_none());
    }

    #[test]
    fn test_shape_load_failure_raises_notice() {
        let mut orch = orchestrator();
        orch.update(Message::Started);
        orch.update(Message::PointPicked(Position::new(1.0, 2.0)));
        orch.update(Message::ShapesLoaded(Err(ClientError::network("connection refused"))));

        let state = orch.state();
        assert!(state.shapes.is_empty());
        assert_eq!(state.notice.as_ref().unwrap().message, SHAPES_FAILED_NOTICE);
        assert!(!state.can_generate());
        assert!(orch.update(Message::GenerateRequested).is_empty());
    }

    #[test]
    fn test_unknown_shape_ignored() {
        let mut orch = ready();
        orch.update(Message::ShapeSelected("nope_99".to_string()));
        assert_eq!(orch.state().selected_shape_id.as_deref(), Some("star_01"));

        orch.update(Message::ShapeSelected("heart_02".to_string()));
        assert_eq!(orch.state().selected_shape_id.as_deref(), Some("heart_02"));
    }

    #[test]
    fn test_distance_is_normalized() {
        let mut orch = orchestrator();
        orch.update(Message::DistanceChanged(33.0));
        assert_eq!(orch.state().target_distance_km, 20.0);
        orch.update(Message::DistanceChanged(6.6));
        assert_eq!(orch.state().target_distance_km, 6.5);
    }

    #[test]
    fn test_generate_issues_wire_request() {
        let mut orch = ready();
        let commands = orch.update(Message::GenerateRequested);
        assert_eq!(
            commands,
            vec![Command::GenerateRoute {
                seq: 1,
                request: RouteRequest::new("star_01", Position::new(48.8566, 2.3522), 5.0),
            }]
        );
        assert!(orch.state().generation_in_flight);
    }

    #[test]
    fn test_generate_gate_holds_while_in_flight() {
        let mut orch = ready();
        assert_eq!(orch.update(Message::GenerateRequested).len(), 1);
        assert!(orch.update(Message::GenerateRequested).is_empty());
        assert_eq!(orch.generation_seq(), 1);
    }

    #[test]
    fn test_generate_ignored_without_point() {
        let mut orch = orchestrator();
        orch.update(Message::Started);
        orch.update(Message::ShapesLoaded(Ok(vec![shape("star_01")])));
        assert!(orch.update(Message::GenerateRequested).is_empty());
        assert!(!orch.state().generation_in_flight);
    }

    #[test]
    fn test_success_stores_route_and_refits() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(route("star_01")),
        });

        let state = orch.state();
        assert!(!state.generation_in_flight);
        assert_eq!(state.route_revision, 1);
        let last = state.last_route.as_ref().unwrap();
        assert!(!last.coordinates.is_empty());
        assert!(last.distance_meters >= 0.0);
        assert_eq!(last.shape_id, "star_01");

        assert_eq!(state.viewport, orch.map().viewport());
        let visible: GeoBounds = orch.map().visible_bounds();
        assert!(last.positions().all(|p| visible.contains(p)));
    }

    #[test]
    fn test_failure_keeps_previous_route() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(route("star_01")),
        });

        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Err(ClientError::protocol("backend returned 400: No route found")),
        });

        let state = orch.state();
        assert!(!state.generation_in_flight);
        assert_eq!(state.route_revision, 1);
        assert_eq!(state.last_route, Some(route("star_01")));
        assert_eq!(state.notice.as_ref().unwrap().message, GENERATION_FAILED_NOTICE);
    }

    #[test]
    fn test_empty_route_is_a_failure() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        let mut empty = route("star_01");
        empty.coordinates.clear();
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(empty),
        });

        assert!(orch.state().last_route.is_none());
        assert!(orch.state().notice.is_some());
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut orch = ready();
        let first = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq: first,
            result: Err(ClientError::network("reset")),
        });
        let second = generate_seq(&orch.update(Message::GenerateRequested));
        assert!(second > first);

        // A late duplicate of the first request must not touch state.
        orch.update(Message::RouteGenerated {
            seq: first,
            result: Ok(route("star_01")),
        });
        assert!(orch.state().last_route.is_none());
        assert!(orch.state().generation_in_flight);

        orch.update(Message::RouteGenerated {
            seq: second,
            result: Ok(route("star_01")),
        });
        assert!(orch.state().last_route.is_some());
    }

    #[test]
    fn test_location_search_success_recenters() {
        let mut orch = orchestrator();
        let commands = orch.update(Message::LocationSearchSubmitted(" Paris, France ".into()));
        assert_eq!(
            commands,
            vec![Command::Geocode {
                seq: 1,
                query: "Paris, France".to_string()
            }]
        );
        assert!(orch.state().search_in_flight);
        assert!(orch
            .update(Message::LocationSearchSubmitted("Lyon".into()))
            .is_empty());

        let paris = Position::new(48.8588897, 2.320041);
        orch.update(Message::LocationResolved {
            seq: 1,
            result: Ok(paris),
        });
        let state = orch.state();
        assert!(!state.search_in_flight);
        assert_eq!(state.selected_point, Some(paris));
        assert_eq!(state.viewport.center, paris);
        assert_eq!(state.viewport.zoom, 14.0);
    }

    #[test]
    fn test_location_not_found_leaves_state() {
        let mut orch = orchestrator();
        orch.update(Message::PointPicked(Position::new(1.0, 2.0)));
        orch.update(Message::LocationSearchSubmitted("Atlantis".into()));
        orch.update(Message::LocationResolved {
            seq: 1,
            result: Err(ClientError::lookup("Atlantis")),
        });

        let state = orch.state();
        assert_eq!(state.selected_point, Some(Position::new(1.0, 2.0)));
        assert_eq!(state.notice.as_ref().unwrap().message, LOCATION_NOT_FOUND_NOTICE);
    }

    #[test]
    fn test_geocoder_outage_notice() {
        let mut orch = orchestrator();
        orch.update(Message::LocationSearchSubmitted("Paris".into()));
        orch.update(Message::LocationResolved {
            seq: 1,
            result: Err(ClientError::network("dns")),
        });
        assert_eq!(
            orch.state().notice.as_ref().unwrap().message,
            SEARCH_FAILED_NOTICE
        );
        orch.update(Message::NoticeDismissed);
        assert!(orch.state().notice.is_none());
    }

    #[test]
    fn test_download_uses_current_form_values() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(route("star_01")),
        });

        orch.update(Message::ShapeSelected("heart_02".to_string()));
        orch.update(Message::DistanceChanged(8.0));
        let commands = orch.update(Message::DownloadRequested);
        assert_eq!(
            commands,
            vec![Command::DownloadTrack {
                file_name: "heart_02_5.2347km.gpx".to_string(),
                request: RouteRequest::new("heart_02", Position::new(48.8566, 2.3522), 8.0),
            }]
        );
        assert!(orch.state().download_in_flight);
        assert!(orch.update(Message::DownloadRequested).is_empty());
    }

    #[test]
    fn test_download_without_route_ignored() {
        let mut orch = ready();
        assert!(orch.update(Message::DownloadRequested).is_empty());
    }

    #[test]
    fn test_download_then_save() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(route("star_01")),
        });
        orch.update(Message::DownloadRequested);

        let commands = orch.update(Message::TrackDownloaded {
            file_name: "star_01_5.2347km.gpx".to_string(),
            result: Ok(b"<gpx/>".to_vec()),
        });
        assert_eq!(
            commands,
            vec![Command::SaveTrack {
                file_name: "star_01_5.2347km.gpx".to_string(),
                bytes: b"<gpx/>".to_vec(),
            }]
        );
        assert!(orch.state().download_in_flight);

        orch.update(Message::TrackSaved {
            bytes: 6,
            result: Err(SaveError::Cancelled),
        });
        assert!(!orch.state().download_in_flight);
        let notice = orch.state().notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.message, SAVE_CANCELLED_NOTICE);
    }

    #[test]
    fn test_download_failure_notice() {
        let mut orch = ready();
        let seq = generate_seq(&orch.update(Message::GenerateRequested));
        orch.update(Message::RouteGenerated {
            seq,
            result: Ok(route("star_01")),
        });
        orch.update(Message::DownloadRequested);
        let commands = orch.update(Message::TrackDownloaded {
            file_name: "star_01_5.2347km.gpx".to_string(),
            result: Err(ClientError::network("reset")),
        });

        assert!(commands.is_empty());
        assert!(!orch.state().download_in_flight);
        assert_eq!(
            orch.state().notice.as_ref().unwrap().message,
            DOWNLOAD_FAILED_NOTICE
        );
    }

    #[test]
    fn test_notices_reach_bus_subscribers() {
        let bus = Arc::new(EventBus::new());
        let seen = thread_safe_vec();
        let sink = seen.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Notice]),
            move |event| sink.lock().push(event),
        );

        let mut orch = Orchestrator::new(&Config::default(), bus);
        orch.update(Message::Started);
        orch.update(Message::ShapesLoaded(Err(ClientError::network("refused"))));
        orch.update(Message::PointPicked(Position::new(1.0, 2.0)));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], AppEvent::Notice(n) if n.message == SHAPES_FAILED_NOTICE));
    }
}
