//! Data model shared between the route backend client and the UI layer.
//!
//! Field names follow the Rust side; the serde attributes map them onto the
//! backend's wire names (`symbol_id`, `distance_m`, `original_filename`, ...).

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
///
/// Values are not range-checked; whatever the map or geocoder produced is
/// forwarded to the backend as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for Position {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Serializes a [`Position`] as a `[lat, lon]` pair.
mod lat_lon_pair {
    use super::Position;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(pos: &Position, serializer: S) -> Result<S::Ok, S::Error> {
        (pos.lat, pos.lon).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Position, D::Error> {
        let (lat, lon) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Position { lat, lon })
    }
}

/// Visible map region: center point and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Position,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(center: Position, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

fn default_normalized_length() -> f64 {
    1.0
}

/// A geometric template previously uploaded to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    pub name: String,
    #[serde(rename = "original_filename")]
    pub source_file_name: String,
    #[serde(rename = "num_points")]
    pub point_count: u32,
    #[serde(default = "default_normalized_length")]
    pub normalized_length: f64,
}

impl Shape {
    /// Label shown in the shape selector, e.g. `"star - star"` for
    /// `star.svg` uploaded as `star_1a2b3c4d`.
    pub fn display_label(&self) -> String {
        let file = self.source_file_name.replacen(".svg", "", 1);
        let prefix = self.id.split('_').next().unwrap_or(&self.id);
        format!("{} - {}", file, prefix)
    }
}

/// Parameters for one generation or download call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RouteRequestBody", from = "RouteRequestBody")]
pub struct RouteRequest {
    pub shape_id: String,
    pub start: Position,
    pub target_distance_km: f64,
}

impl RouteRequest {
    pub fn new(shape_id: impl Into<String>, start: Position, target_distance_km: f64) -> Self {
        Self {
            shape_id: shape_id.into(),
            start,
            target_distance_km,
        }
    }
}

/// JSON body accepted by the `/route*` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteRequestBody {
    symbol_id: String,
    start_lat: f64,
    start_lon: f64,
    target_distance_km: f64,
}

impl From<RouteRequest> for RouteRequestBody {
    fn from(req: RouteRequest) -> Self {
        Self {
            symbol_id: req.shape_id,
            start_lat: req.start.lat,
            start_lon: req.start.lon,
            target_distance_km: req.target_distance_km,
        }
    }
}

impl From<RouteRequestBody> for RouteRequest {
    fn from(body: RouteRequestBody) -> Self {
        Self {
            shape_id: body.symbol_id,
            start: Position::new(body.start_lat, body.start_lon),
            target_distance_km: body.target_distance_km,
        }
    }
}

/// A generated route: path vertices in traversal order plus its length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// `(lat, lon)` pairs.
    pub coordinates: Vec<(f64, f64)>,
    #[serde(rename = "distance_m")]
    pub distance_meters: f64,
    #[serde(rename = "symbol_id")]
    pub shape_id: String,
    #[serde(with = "lat_lon_pair")]
    pub start: Position,
}

impl RouteResult {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.coordinates.iter().copied().map(Position::from)
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// A route together with its serialized GPX track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpxResult {
    #[serde(flatten)]
    pub route: RouteResult,
    pub gpx_content: String,
}

impl GpxResult {
    pub fn track_bytes(&self) -> &[u8] {
        self.gpx_content.as_bytes()
    }
}
