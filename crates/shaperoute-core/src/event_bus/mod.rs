//! # Event Bus Module
//!
//! Provides an event bus for decoupled observation of the orchestrator.
//!
//! ## Overview
//!
//! The orchestrator publishes typed events as it mutates the session; front-ends
//! and diagnostics subscribe to the categories they care about:
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter and receive events of interest
//! - Handlers run synchronously on the publishing task
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shaperoute_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Notice]),
//!     |event| {
//!         if let AppEvent::Notice(notice) = event {
//!             println!("{}", notice.message);
//!         }
//!     },
//! );
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
