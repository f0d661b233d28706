//! Read-only projections over the document collection, recomputed per call.

use uuid::Uuid;

use crate::storage::{Document, DocumentStore};

/// One level of the owner's tree: direct children of `parent`, or the
/// owner's root documents when `parent` is `None`. Archived branches are
/// hidden.
pub fn children_of(store: &DocumentStore, user_id: &str, parent: Option<Uuid>) -> Vec<Document> {
    store
        .documents()
        .iter()
        .filter(|d| d.user_id == user_id && !d.is_archived && d.parent_document_id == parent)
        .cloned()
        .collect()
}

/// The owner's archived documents, optionally narrowed by a case-insensitive
/// title substring. A blank owner yields nothing.
pub fn trash(store: &DocumentStore, user_id: &str, title_filter: Option<&str>) -> Vec<Document> {
    if user_id.trim().is_empty() {
        return Vec::new();
    }
    let needle = title_filter.map(str::to_lowercase);
    store
        .documents()
        .iter()
        .filter(|d| d.user_id == user_id && d.is_archived)
        .filter(|d| match &needle {
            Some(needle) => d.title.to_lowercase().contains(needle),
            None => true,
        })
        .cloned()
        .collect()
}

/// Most recently updated non-archived documents, capped at `limit`.
pub fn recents(store: &DocumentStore, limit: usize) -> Vec<Document> {
    let mut docs: Vec<Document> = store
        .documents()
        .iter()
        .filter(|d| !d.is_archived)
        .cloned()
        .collect();
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    docs.truncate(limit);
    docs
}

/// The owner's non-archived documents whose title contains `query`,
/// case-insensitively. An empty query matches everything.
pub fn search(store: &DocumentStore, user_id: &str, query: &str) -> Vec<Document> {
    if user_id.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    store
        .documents()
        .iter()
        .filter(|d| d.user_id == user_id && !d.is_archived)
        .filter(|d| d.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
