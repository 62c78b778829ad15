//! Event Bus implementation.
//!
//! The bus is an ordinary value owned by the application runtime and handed
//! to whoever needs to publish or subscribe; there is no global instance.
//! Handlers are called synchronously on the publisher's task, in no
//! particular order.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Which events a subscriber wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Only events in one of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

struct Subscriber {
    filter: EventFilter,
    handler: Box<dyn Fn(AppEvent) + Send + Sync>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    /// Nobody is subscribed at all.
    #[error("No active subscribers")]
    NoSubscribers,
}

/// Event bus for session and request lifecycle events
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `event` to every subscriber whose filter accepts it.
    ///
    /// Returns how many handlers were called. Handlers must not subscribe or
    /// unsubscribe from inside the call.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        tracing::trace!("Event: {}", event.description());

        let subscribers = self.subscribers.read();
        if subscribers.is_empty() {
            return Err(EventBusError::NoSubscribers);
        }

        let mut delivered = 0;
        for subscriber in subscribers.values() {
            if subscriber.filter.matches(&event) {
                (subscriber.handler)(event.clone());
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Register `handler` for the events `filter` accepts.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.subscribers.write().insert(
            id,
            Subscriber {
                filter,
                handler: Box::new(handler),
            },
        );
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
