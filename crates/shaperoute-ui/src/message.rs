//! Messages flowing into the orchestrator and the effects flowing out.

use shaperoute_core::{ClientError, Position, RouteRequest, RouteResult, SaveError, Shape};
use std::path::PathBuf;

/// User intent and effect completions.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The front-end is up; triggers the one-time shape fetch.
    Started,
    PointPicked(Position),
    LocationSearchSubmitted(String),
    ShapeSelected(String),
    DistanceChanged(f64),
    GenerateRequested,
    DownloadRequested,
    NoticeDismissed,

    ShapesLoaded(Result<Vec<Shape>, ClientError>),
    LocationResolved {
        seq: u64,
        result: Result<Position, ClientError>,
    },
    RouteGenerated {
        seq: u64,
        result: Result<RouteResult, ClientError>,
    },
    TrackDownloaded {
        file_name: String,
        result: Result<Vec<u8>, ClientError>,
    },
    TrackSaved {
        bytes: usize,
        result: Result<PathBuf, SaveError>,
    },
}

/// Side effects requested by the orchestrator.
///
/// Each command produces exactly one completion [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadShapes,
    Geocode { seq: u64, query: String },
    GenerateRoute { seq: u64, request: RouteRequest },
    DownloadTrack { file_name: String, request: RouteRequest },
    SaveTrack { file_name: String, bytes: Vec<u8> },
}
