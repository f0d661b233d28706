//! Reactive wrapper around the document repository. The hub is constructed
//! once at application start and shared behind an `Arc`; every mutation goes
//! through it so that events and persistence stay consistent with the
//! in-memory collection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use uuid::Uuid;

use crate::events::{Event, EventBus};
use crate::objects::ObjectStore;
use crate::storage::{Document, DocumentPatch, DocumentStore};
use crate::views;

/// Fixed namespace the collection is persisted under.
pub const STORAGE_NAMESPACE: &str = "documents-storage";

pub struct DocumentHub {
    store: RwLock<DocumentStore>,
    events: EventBus,
    storage_path: Option<PathBuf>,
}

impl DocumentHub {
    /// A hub with no durable backing. Mutations stay in memory.
    pub fn in_memory() -> Self {
        Self {
            store: RwLock::new(DocumentStore::new()),
            events: EventBus::new(),
            storage_path: None,
        }
    }

    /// Open a hub persisted under `dir`, hydrating the collection from a
    /// previous session if one was written. A corrupt or unreadable file is
    /// logged and ignored; the session starts empty and in-memory state is
    /// authoritative from then on.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{STORAGE_NAMESPACE}.json"));
        Ok(Self {
            store: RwLock::new(hydrate(&path)),
            events: EventBus::new(),
            storage_path: Some(path),
        })
    }

    // ---- reads ----

    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.store.read().get(id).cloned()
    }

    pub fn list_by_owner(&self, user_id: &str, include_archived: bool) -> Result<Vec<Document>> {
        self.store.read().list_by_owner(user_id, include_archived)
    }

    pub fn children_of(&self, user_id: &str, parent: Option<Uuid>) -> Vec<Document> {
        views::children_of(&self.store.read(), user_id, parent)
    }

    pub fn trash(&self, user_id: &str, title_filter: Option<&str>) -> Vec<Document> {
        views::trash(&self.store.read(), user_id, title_filter)
    }

    pub fn recents(&self, limit: usize) -> Vec<Document> {
        views::recents(&self.store.read(), limit)
    }

    pub fn search(&self, user_id: &str, query: &str) -> Vec<Document> {
        views::search(&self.store.read(), user_id, query)
    }

    // ---- mutations ----

    pub fn create(
        &self,
        user_id: &str,
        title: &str,
        parent: Option<Uuid>,
    ) -> Result<Option<Document>> {
        let created = self.store.write().create(user_id, title, parent)?;
        if let Some(doc) = &created {
            self.after_mutation(Event::Created { id: doc.id });
        }
        Ok(created)
    }

    pub fn update(&self, id: Uuid, patch: &DocumentPatch) -> Option<Document> {
        let updated = self.store.write().update(id, patch)?;
        self.after_mutation(Event::Updated { id });
        Some(updated)
    }

    pub fn publish(&self, id: Uuid) -> Option<Document> {
        let published = self.store.write().publish(id)?;
        self.after_mutation(Event::Published { id });
        Some(published)
    }

    pub fn unpublish(&self, id: Uuid) -> Option<Document> {
        let unpublished = self.store.write().unpublish(id)?;
        self.after_mutation(Event::Unpublished { id });
        Some(unpublished)
    }

    /// Restore a single document from the trash. Descendants stay archived.
    pub fn restore(&self, id: Uuid) -> Option<Document> {
        let restored = self.store.write().restore(id)?;
        self.after_mutation(Event::Restored { id });
        Some(restored)
    }

    /// Archive the document and its entire subtree.
    pub fn archive(&self, id: Uuid) -> bool {
        if !self.store.write().archive(id) {
            return false;
        }
        self.after_mutation(Event::Archived { id });
        true
    }

    /// Permanently delete the document and its entire subtree.
    pub fn delete(&self, id: Uuid) -> bool {
        if !self.store.write().delete(id) {
            return false;
        }
        self.after_mutation(Event::Deleted { id });
        true
    }

    pub fn set_cover_image(&self, id: Uuid, url: impl Into<String>) -> Option<Document> {
        self.update(id, &DocumentPatch::new().cover_image(url))
    }

    /// Remove a document's cover: delete the remote object, then clear the
    /// local field. Local state is authoritative, so a failed remote delete
    /// leaves an orphaned object rather than a stale cover; the clearing
    /// update is the success signal.
    pub async fn remove_cover_image(&self, id: Uuid, objects: &dyn ObjectStore) -> Option<Document> {
        if let Some(url) = self.get(id)?.cover_image {
            if let Err(err) = objects.delete(&url).await {
                tracing::warn!(%id, %err, "remote cover delete failed");
            }
        }
        self.update(id, &DocumentPatch::new().clear_cover_image())
    }

    // ---- subscriptions ----

    /// Raw feed of mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<Event> {
        self.events.stream()
    }

    /// Watch a selected slice of the collection. The selector re-runs after
    /// every mutation and the stream yields only when the selected value
    /// differs from the last one delivered, so consumers miss no updates and
    /// see no unrelated ones. Requires a tokio runtime.
    pub fn watch<T, F>(self: Arc<Self>, selector: F) -> impl Stream<Item = T> + Unpin
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&DocumentStore) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut events = self.subscribe();
        let mut last = selector(&*self.store.read());
        // Hold the hub weakly so a forgotten watcher cannot keep it alive.
        let weak = Arc::downgrade(&self);
        drop(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    // A lagged receiver still recomputes from the live
                    // collection, so no state is lost.
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let Some(hub) = weak.upgrade() else { break };
                let current = selector(&*hub.store.read());
                if current != last {
                    if tx.send(current.clone()).is_err() {
                        break;
                    }
                    last = current;
                }
            }
        });
        UnboundedReceiverStream::new(rx)
    }

    // ---- persistence ----

    /// Serialize the collection to the storage namespace. Failures are
    /// logged and swallowed; in-memory state stays authoritative for the
    /// session. A hub without a backing path is a no-op.
    pub fn persist(&self) {
        let Some(path) = &self.storage_path else {
            return;
        };
        let data = match serde_json::to_string_pretty(self.store.read().documents()) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize document collection");
                return;
            }
        };
        if let Err(err) = std::fs::write(path, data) {
            tracing::warn!(path = %path.display(), %err, "failed to persist document collection");
            return;
        }
        self.store.write().clear_dirty();
    }

    fn after_mutation(&self, event: Event) {
        tracing::debug!(?event, "document mutation");
        self.events.send(event);
        self.persist();
    }
}

fn hydrate(path: &Path) -> DocumentStore {
    if !path.exists() {
        return DocumentStore::new();
    }
    let loaded = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| Ok(serde_json::from_str::<Vec<Document>>(&data)?));
    match loaded {
        Ok(documents) => {
            tracing::debug!(count = documents.len(), "hydrated document collection");
            DocumentStore::with_documents(documents)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to hydrate document collection, starting empty");
            DocumentStore::new()
        }
    }
}
