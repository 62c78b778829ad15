//! Map interaction surface.
//!
//! Holds the viewport of a slippy map of fixed pixel size and converts
//! between screen pixels and geographic positions with spherical Web
//! Mercator, the projection used by the tile source. The surface decides
//! when to reframe itself around a freshly generated route; everything it
//! draws comes from [`SessionState`].

use crate::message::Message;
use crate::state::SessionState;
use shaperoute_core::{Position, RouteResult, Viewport};
use shaperoute_settings::MapSettings;
use std::f64::consts::PI;
use tracing::debug;

/// Dark basemap tiles. `{s}` is the subdomain, `{r}` the retina suffix.
pub const TILE_URL_TEMPLATE: &str =
    "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png";

/// Edge length of one map tile in pixels.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude where the Mercator square ends.
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE_PX * 2f64.powf(zoom)
}

/// Project a position to world pixel coordinates at `zoom`.
pub fn project(position: Position, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (position.lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> Position {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    Position::new(lat, lon)
}

/// Geographic bounding box accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoBounds {
    pub fn new() -> Self {
        Self {
            south: f64::MAX,
            west: f64::MAX,
            north: f64::MIN,
            east: f64::MIN,
        }
    }

    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        let mut bounds = Self::new();
        for position in positions {
            bounds.update(position);
        }
        bounds
    }

    pub fn update(&mut self, position: Position) {
        self.south = self.south.min(position.lat);
        self.north = self.north.max(position.lat);
        self.west = self.west.min(position.lon);
        self.east = self.east.max(position.lon);
    }

    pub fn is_valid(&self) -> bool {
        self.south.is_finite()
            && self.north.is_finite()
            && self.west.is_finite()
            && self.east.is_finite()
            && self.south <= self.north
            && self.west <= self.east
    }

    /// Strict containment; points on the edge are outside.
    pub fn contains(&self, position: Position) -> bool {
        position.lat > self.south
            && position.lat < self.north
            && position.lon > self.west
            && position.lon < self.east
    }

    pub fn north_west(&self) -> Position {
        Position::new(self.north, self.west)
    }

    pub fn south_east(&self) -> Position {
        Position::new(self.south, self.east)
    }
}

/// What the map widget has to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene<'a> {
    pub tile_url: &'static str,
    pub viewport: Viewport,
    /// Start marker, absent until a point is chosen.
    pub marker: Option<Position>,
    /// Route polyline, absent until a non-empty route exists.
    pub polyline: Option<&'a [(f64, f64)]>,
}

/// Viewport controller for a map of fixed pixel size.
#[derive(Debug, Clone)]
pub struct MapSurface {
    viewport: Viewport,
    width_px: f64,
    height_px: f64,
    padding_px: f64,
    min_zoom: f64,
    max_zoom: f64,
    fitted_revision: u64,
}

impl MapSurface {
    pub fn new(settings: &MapSettings) -> Self {
        Self {
            viewport: Viewport::new(settings.default_center, settings.default_zoom),
            width_px: settings.surface_width_px,
            height_px: settings.surface_height_px,
            padding_px: settings.fit_padding_px,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            fitted_revision: 0,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn size_px(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Move the view to `center` at `zoom` without any user gesture.
    pub fn recenter(&mut self, center: Position, zoom: f64) -> Viewport {
        self.viewport = Viewport::new(center, self.clamp_zoom(zoom));
        debug!("Map recentered on {} @ z{}", center, self.viewport.zoom);
        self.viewport
    }

    /// Geographic region currently on screen.
    pub fn visible_bounds(&self) -> GeoBounds {
        let north_west = self.position_at(0.0, 0.0);
        let south_east = self.position_at(self.width_px, self.height_px);
        GeoBounds {
            south: south_east.lat,
            west: north_west.lon,
            north: north_west.lat,
            east: south_east.lon,
        }
    }

    /// Position under the pixel `(x, y)`, measured from the top-left corner.
    pub fn position_at(&self, x_px: f64, y_px: f64) -> Position {
        let zoom = self.viewport.zoom;
        let (cx, cy) = project(self.viewport.center, zoom);
        unproject(
            cx - self.width_px / 2.0 + x_px,
            cy - self.height_px / 2.0 + y_px,
            zoom,
        )
    }

    /// Translate a click into the message that selects its position.
    pub fn click(&self, x_px: f64, y_px: f64) -> Message {
        Message::PointPicked(self.position_at(x_px, y_px))
    }

    /// Largest integer zoom at which `bounds` fits inside the padded surface.
    pub fn fit_zoom(&self, bounds: &GeoBounds) -> f64 {
        let usable_w = self.width_px - 2.0 * self.padding_px;
        let usable_h = self.height_px - 2.0 * self.padding_px;

        let (x0, y0) = project(bounds.north_west(), 0.0);
        let (x1, y1) = project(bounds.south_east(), 0.0);
        let scale = (usable_w / (x1 - x0).abs()).min(usable_h / (y1 - y0).abs());

        // A single point gives an infinite scale and lands on max zoom.
        let zoom = (scale.log2() * 100.0).round() / 100.0;
        self.clamp_zoom(zoom.floor())
    }

    /// Frame `bounds` with the configured margin on every side.
    pub fn fit_bounds(&mut self, bounds: &GeoBounds) -> Viewport {
        let zoom = self.fit_zoom(bounds);
        let (x0, y0) = project(bounds.north_west(), zoom);
        let (x1, y1) = project(bounds.south_east(), zoom);
        let center = unproject((x0 + x1) / 2.0, (y0 + y1) / 2.0, zoom);
        self.viewport = Viewport::new(center, zoom);
        debug!("Map fitted to route: {} @ z{}", center, zoom);
        self.viewport
    }

    /// Refit to `route` once per `revision`.
    ///
    /// Returns the new viewport when a refit happened.
    pub fn sync_route(&mut self, route: Option<&RouteResult>, revision: u64) -> Option<Viewport> {
        if revision == self.fitted_revision {
            return None;
        }
        let route = route.filter(|r| !r.is_empty())?;
        let bounds = GeoBounds::from_positions(route.positions());
        if !bounds.is_valid() {
            return None;
        }
        self.fitted_revision = revision;
        Some(self.fit_bounds(&bounds))
    }

    pub fn scene<'a>(&self, state: &'a SessionState) -> MapScene<'a> {
        MapScene {
            tile_url: TILE_URL_TEMPLATE,
            viewport: self.viewport,
            marker: state.selected_point,
            polyline: state
                .last_route
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| r.coordinates.as_slice()),
        }
    }
}
