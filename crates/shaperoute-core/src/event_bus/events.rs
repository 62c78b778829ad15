//! Event type definitions for the event bus.
//!
//! Events are organized by category. They are cloneable and serializable so
//! they can be logged or replayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{Position, RouteRequest, Viewport};

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Form and map selection changes
    Session(SessionEvent),
    /// Route generation lifecycle
    Generation(GenerationEvent),
    /// Track download lifecycle
    Download(DownloadEvent),
    /// User-visible notices
    Notice(NoticeEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Session(_) => EventCategory::Session,
            AppEvent::Generation(_) => EventCategory::Generation,
            AppEvent::Download(_) => EventCategory::Download,
            AppEvent::Notice(_) => EventCategory::Notice,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Session(e) => e.description(),
            AppEvent::Generation(e) => e.description(),
            AppEvent::Download(e) => e.description(),
            AppEvent::Notice(e) => format!("[{}] {}", e.level, e.message),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Session,
    Generation,
    Download,
    Notice,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Session => write!(f, "Session"),
            EventCategory::Generation => write!(f, "Generation"),
            EventCategory::Download => write!(f, "Download"),
            EventCategory::Notice => write!(f, "Notice"),
        }
    }
}

/// Session state changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Shape list arrived from the backend.
    ShapesLoaded {
        /// Number of shapes in the list.
        count: usize,
    },
    /// Start point changed (map click or location search).
    PointSelected {
        /// The new start point.
        position: Position,
    },
    /// Shape selection changed.
    ShapeSelected {
        /// Id of the selected shape.
        shape_id: String,
    },
    /// Target distance changed.
    DistanceChanged {
        /// New target distance in kilometers.
        km: f64,
    },
    /// The map was re-centered or refit.
    ViewportChanged {
        /// The new viewport.
        viewport: Viewport,
    },
}

impl SessionEvent {
    fn description(&self) -> String {
        match self {
            SessionEvent::ShapesLoaded { count } => format!("{} shapes loaded", count),
            SessionEvent::PointSelected { position } => format!("Start point {}", position),
            SessionEvent::ShapeSelected { shape_id } => format!("Shape {}", shape_id),
            SessionEvent::DistanceChanged { km } => format!("Distance {} km", km),
            SessionEvent::ViewportChanged { viewport } => {
                format!("Viewport {} @ z{}", viewport.center, viewport.zoom)
            }
        }
    }
}

/// Route generation lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GenerationEvent {
    /// A generation request was issued.
    Started {
        /// Sequence number of the request.
        seq: u64,
        /// The request that was sent.
        request: RouteRequest,
    },
    /// The latest request succeeded.
    Succeeded {
        /// Sequence number of the request.
        seq: u64,
        /// Route length in meters.
        distance_m: f64,
        /// Number of vertices in the route.
        points: usize,
    },
    /// The latest request failed.
    Failed {
        /// Sequence number of the request.
        seq: u64,
        /// Error message.
        error: String,
    },
    /// A completion arrived for a request that is no longer the latest.
    StaleDiscarded {
        /// Sequence number of the stale completion.
        seq: u64,
        /// Sequence number of the latest issued request.
        latest: u64,
    },
}

impl GenerationEvent {
    fn description(&self) -> String {
        match self {
            GenerationEvent::Started { seq, request } => format!(
                "Generation #{} started: {} from {} for {} km",
                seq, request.shape_id, request.start, request.target_distance_km
            ),
            GenerationEvent::Succeeded {
                seq,
                distance_m,
                points,
            } => format!(
                "Generation #{} succeeded: {} points, {:.0} m",
                seq, points, distance_m
            ),
            GenerationEvent::Failed { seq, error } => {
                format!("Generation #{} failed: {}", seq, error)
            }
            GenerationEvent::StaleDiscarded { seq, latest } => {
                format!("Generation #{} discarded (latest is #{})", seq, latest)
            }
        }
    }
}

/// Track download lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DownloadEvent {
    /// A download request was issued.
    Started {
        /// File name the track will be saved under.
        file_name: String,
    },
    /// The track was written to disk.
    Saved {
        /// Where the file ended up.
        path: PathBuf,
        /// Payload size in bytes.
        bytes: usize,
    },
    /// The download or save failed.
    Failed {
        /// Error message.
        error: String,
    },
}

impl DownloadEvent {
    fn description(&self) -> String {
        match self {
            DownloadEvent::Started { file_name } => format!("Downloading {}", file_name),
            DownloadEvent::Saved { path, bytes } => {
                format!("Saved {} bytes to {}", bytes, path.display())
            }
            DownloadEvent::Failed { error } => format!("Download failed: {}", error),
        }
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// A message the front-end must show to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeEvent {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl NoticeEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}
