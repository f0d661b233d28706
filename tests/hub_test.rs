use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use notehub_core::events::Event;
use notehub_core::hub::{DocumentHub, STORAGE_NAMESPACE};
use notehub_core::objects::{MemoryObjectStore, ObjectStore};
use notehub_core::storage::DocumentPatch;

#[test]
fn mutations_are_visible_to_following_reads() {
    let hub = DocumentHub::in_memory();
    let doc = hub.create("u1", "First", None).unwrap().unwrap();
    assert_eq!(hub.get(doc.id).unwrap().title, "First");

    hub.update(doc.id, &DocumentPatch::new().title("Renamed"))
        .unwrap();
    assert_eq!(hub.get(doc.id).unwrap().title, "Renamed");

    let listed = hub.list_by_owner("u1", false).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Renamed");
}

#[test]
fn archive_cascade_hides_subtree_from_listing() {
    let hub = DocumentHub::in_memory();
    let root = hub.create("u1", "Root", None).unwrap().unwrap();
    hub.create("u1", "Child", Some(root.id)).unwrap().unwrap();

    assert!(hub.archive(root.id));
    assert!(hub.list_by_owner("u1", false).unwrap().is_empty());

    let all = hub.list_by_owner("u1", true).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|d| d.is_archived));
}

#[tokio::test]
async fn mutations_emit_events() {
    let hub = DocumentHub::in_memory();
    let mut events = hub.subscribe();

    let doc = hub.create("u1", "Note", None).unwrap().unwrap();
    hub.publish(doc.id).unwrap();
    hub.unpublish(doc.id).unwrap();
    assert!(hub.archive(doc.id));
    hub.restore(doc.id).unwrap();
    assert!(hub.delete(doc.id));

    let id = doc.id;
    assert_eq!(events.recv().await.unwrap(), Event::Created { id });
    assert_eq!(events.recv().await.unwrap(), Event::Published { id });
    assert_eq!(events.recv().await.unwrap(), Event::Unpublished { id });
    assert_eq!(events.recv().await.unwrap(), Event::Archived { id });
    assert_eq!(events.recv().await.unwrap(), Event::Restored { id });
    assert_eq!(events.recv().await.unwrap(), Event::Deleted { id });
}

#[tokio::test]
async fn failed_mutations_emit_nothing() {
    let hub = DocumentHub::in_memory();
    let mut events = hub.subscribe();

    assert!(hub
        .create("u1", "Orphan", Some(uuid::Uuid::new_v4()))
        .unwrap()
        .is_none());
    assert!(!hub.archive(uuid::Uuid::new_v4()));
    assert!(!hub.delete(uuid::Uuid::new_v4()));

    let doc = hub.create("u1", "Real", None).unwrap().unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        Event::Created { id: doc.id }
    );
}

#[tokio::test]
async fn event_stream_yields_document_ids() {
    let hub = DocumentHub::in_memory();
    let mut stream = hub.event_stream();
    let doc = hub.create("u1", "Note", None).unwrap().unwrap();
    let event = stream.next().await.unwrap().unwrap();
    assert_eq!(event.document_id(), doc.id);
}

#[tokio::test]
async fn watch_notifies_on_selected_changes_only() {
    let hub = Arc::new(DocumentHub::in_memory());
    let doc = hub.create("u1", "Watched", None).unwrap().unwrap();
    let other = hub.create("u2", "Other", None).unwrap().unwrap();

    let id = doc.id;
    let mut titles = hub
        .clone()
        .watch(move |store| store.get(id).map(|d| d.title.clone()));

    // The unrelated mutation leaves the selected slice unchanged, so only
    // the rename comes through.
    hub.update(other.id, &DocumentPatch::new().title("Changed"))
        .unwrap();
    hub.update(doc.id, &DocumentPatch::new().title("Renamed"))
        .unwrap();

    let next = tokio::time::timeout(Duration::from_secs(1), titles.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.as_deref(), Some("Renamed"));

    assert!(
        tokio::time::timeout(Duration::from_millis(100), titles.next())
            .await
            .is_err()
    );
}

#[test]
fn collection_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root_id = {
        let hub = DocumentHub::open(dir.path()).unwrap();
        let root = hub.create("u1", "Root", None).unwrap().unwrap();
        hub.create("u1", "Child", Some(root.id)).unwrap().unwrap();
        root.id
    };
    assert!(dir
        .path()
        .join(format!("{STORAGE_NAMESPACE}.json"))
        .exists());

    let hub = DocumentHub::open(dir.path()).unwrap();
    assert_eq!(hub.list_by_owner("u1", false).unwrap().len(), 2);
    assert_eq!(hub.get(root_id).unwrap().title, "Root");
    assert_eq!(hub.children_of("u1", Some(root_id)).len(), 1);
}

#[test]
fn corrupt_persisted_state_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{STORAGE_NAMESPACE}.json"));
    std::fs::write(&path, "not json").unwrap();

    let hub = DocumentHub::open(dir.path()).unwrap();
    assert!(hub.list_by_owner("u1", true).unwrap().is_empty());

    // the session keeps working and re-persists over the bad file
    hub.create("u1", "Fresh", None).unwrap().unwrap();
    let reloaded = DocumentHub::open(dir.path()).unwrap();
    assert_eq!(reloaded.list_by_owner("u1", false).unwrap().len(), 1);
}

#[tokio::test]
async fn cover_removal_deletes_remote_object() {
    let hub = DocumentHub::in_memory();
    let objects = MemoryObjectStore::new();
    let doc = hub.create("u1", "Note", None).unwrap().unwrap();

    let url = objects.upload("cover.png", b"bytes").await.unwrap();
    hub.set_cover_image(doc.id, url.clone()).unwrap();
    assert_eq!(
        hub.get(doc.id).unwrap().cover_image.as_deref(),
        Some(url.as_str())
    );

    let updated = hub.remove_cover_image(doc.id, &objects).await.unwrap();
    assert!(updated.cover_image.is_none());
    assert!(!objects.contains(&url));
    assert!(objects.is_empty());
}

struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload(&self, _name: &str, _data: &[u8]) -> Result<String> {
        Err(anyhow::anyhow!("storage unavailable"))
    }

    async fn delete(&self, _url: &str) -> Result<()> {
        Err(anyhow::anyhow!("storage unavailable"))
    }
}

#[tokio::test]
async fn cover_removal_succeeds_when_remote_delete_fails() {
    let hub = DocumentHub::in_memory();
    let doc = hub.create("u1", "Note", None).unwrap().unwrap();
    hub.set_cover_image(doc.id, "https://files/cover.png")
        .unwrap();

    let updated = hub
        .remove_cover_image(doc.id, &FailingObjectStore)
        .await
        .unwrap();
    assert!(updated.cover_image.is_none());
}
