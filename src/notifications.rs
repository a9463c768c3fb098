// Live refresh channel
//
// Services publish a `LiveEvent` after every committed change; connected
// clients receive them over Server-Sent Events and reload the affected list.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use serde::Serialize;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 256;

/// Which list a change affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Category,
    Vehicle,
    Inventory,
    Order,
    Appointment,
    Payment,
}

/// A change notification: `resource` + `action` + id, with an optional payload
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub resource: Resource,
    pub action: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LiveEvent {
    /// SSE event name, e.g. `order.status_changed`
    pub fn event_name(&self) -> String {
        let resource = match self.resource {
            Resource::Category => "category",
            Resource::Vehicle => "vehicle",
            Resource::Inventory => "inventory",
            Resource::Order => "order",
            Resource::Appointment => "appointment",
            Resource::Payment => "payment",
        };
        format!("{}.{}", resource, self.action)
    }
}

/// Cloneable handle to the broadcast channel
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<LiveEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn broadcast<T: Serialize>(
        &self,
        resource: Resource,
        action: &str,
        id: impl ToString,
        data: Option<&T>,
    ) {
        let event = LiveEvent {
            resource,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        debug!("Broadcasting {} {}", event.event_name(), event.id);
        let _ = self.sender.send(event);
    }

    /// Publish a change without a payload
    pub fn touch(&self, resource: Resource, action: &str, id: impl ToString) {
        self.broadcast::<()>(resource, action, id, None);
    }
}

/// Turn a receiver into a stream of events, skipping over lag gaps
pub fn event_stream(
    receiver: broadcast::Receiver<LiveEvent>,
) -> impl Stream<Item = LiveEvent> + Send + 'static {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Live subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// Handler for GET /api/live
pub async fn live_events_handler(
    State(notifier): State<Notifier>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    use futures::StreamExt;

    debug!("Live subscriber connected");
    let events = event_stream(notifier.subscribe()).map(|event| {
        let sse = Event::default().event(event.event_name());
        Ok(sse
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().event("error")))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
