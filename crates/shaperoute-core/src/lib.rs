//! # Shape Route Core
//!
//! Core types, errors, and the event bus shared by the shape route client.
//! Provides the data model exchanged with the route backend, the error
//! taxonomy used at every boundary, and the in-process event bus used to
//! publish session and request lifecycle events.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{GpxResult, Position, RouteRequest, RouteResult, Shape, Viewport};

pub use error::{ClientError, SaveError};

pub use event_bus::{
    AppEvent, DownloadEvent, EventBus, EventBusError, EventCategory, EventFilter, GenerationEvent,
    NoticeEvent, NoticeLevel, SessionEvent, SubscriptionId,
};

pub use types::{thread_safe, thread_safe_vec, ThreadSafe, ThreadSafeVec};
