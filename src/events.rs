use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// Mutation notifications emitted by the hub. Cascade operations emit a
/// single event carrying the root of the affected subtree; subscribers
/// recompute their slice from the store rather than replaying per-node
/// changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Created { id: Uuid },
    Updated { id: Uuid },
    Published { id: Uuid },
    Unpublished { id: Uuid },
    Archived { id: Uuid },
    Restored { id: Uuid },
    Deleted { id: Uuid },
}

impl Event {
    pub fn document_id(&self) -> Uuid {
        match self {
            Event::Created { id }
            | Event::Updated { id }
            | Event::Published { id }
            | Event::Unpublished { id }
            | Event::Archived { id }
            | Event::Restored { id }
            | Event::Deleted { id } => *id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn stream(&self) -> BroadcastStream<Event> {
        BroadcastStream::new(self.tx.subscribe())
    }

    pub fn send(&self, event: Event) {
        // A send with no live subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
