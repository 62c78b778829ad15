//! Session orchestration and front-end view models for the shape route
//! client.
//!
//! - [`Orchestrator`]: owns [`SessionState`] and reduces [`Message`]s into
//!   [`Command`]s
//! - [`Runtime`]: runs commands against the backend, geocoder, and track sink
//! - [`MapSurface`] and [`ControlPanel`]: what a front-end draws and how its
//!   gestures become messages
//! - [`console`]: a text front-end over all of the above

pub mod console;
pub mod control_panel;
pub mod map_surface;
pub mod message;
pub mod orchestrator;
pub mod runtime;
pub mod state;
pub mod track_sink;

pub use control_panel::{ControlPanel, DistanceRange, PanelView, ShapeOption};
pub use map_surface::{GeoBounds, MapScene, MapSurface, TILE_URL_TEMPLATE};
pub use message::{Command, Message};
pub use orchestrator::Orchestrator;
pub use runtime::{Runtime, Services};
pub use state::SessionState;
pub use track_sink::{DialogTrackSink, DirectoryTrackSink, TrackSink};
