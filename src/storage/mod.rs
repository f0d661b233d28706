//! Flat document collection with tree semantics layered on top.
//! A document's children are computed on demand from `parent_document_id`
//! back-references; no forward child list is maintained, so cascade
//! operations re-query adjacency at every recursion step.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_ICON: &str = "📄";

/// A node in a user's content tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub is_published: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_document_id: Option<Uuid>,
}

impl Document {
    pub(crate) fn new(user_id: &str, title: &str, parent_document_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: normalize_title(title),
            content: String::new(),
            user_id: user_id.to_string(),
            is_published: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
            cover_image: None,
            icon: Some(DEFAULT_ICON.to_string()),
            parent_document_id,
        }
    }

    /// Owner-match check callers run before allowing edits. The store itself
    /// never validates `user_id` against the auth provider.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Parse a raw id string. Blank or malformed input yields `None`.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn normalize_title(title: &str) -> String {
    if title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Clock readings can tie at nanosecond resolution; `updated_at` must stay
/// strictly increasing per document.
fn next_timestamp(after: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > after {
        now
    } else {
        after + Duration::nanoseconds(1)
    }
}

/// Partial update over the mutable fields of a document. Identity fields
/// (`id`, `user_id`, `created_at`) are absent from the type, so they cannot
/// be touched through an update.
#[derive(Clone, Debug, Default)]
pub struct DocumentPatch {
    title: Option<String>,
    content: Option<String>,
    is_published: Option<bool>,
    is_archived: Option<bool>,
    cover_image: Option<Option<String>>,
    icon: Option<Option<String>>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.is_published = Some(published);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }

    pub fn cover_image(mut self, url: impl Into<String>) -> Self {
        self.cover_image = Some(Some(url.into()));
        self
    }

    pub fn clear_cover_image(mut self) -> Self {
        self.cover_image = Some(None);
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(Some(icon.into()));
        self
    }

    pub fn clear_icon(mut self) -> Self {
        self.icon = Some(None);
        self
    }

    fn apply(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(content) = &self.content {
            doc.content = content.clone();
        }
        if let Some(published) = self.is_published {
            doc.is_published = published;
        }
        if let Some(archived) = self.is_archived {
            doc.is_archived = archived;
        }
        if let Some(cover) = &self.cover_image {
            doc.cover_image = cover.clone();
        }
        if let Some(icon) = &self.icon {
            doc.icon = icon.clone();
        }
    }
}

/// Owns the document collection and implements CRUD plus the recursive
/// cascade operations. Order is insertion order.
pub struct DocumentStore {
    documents: Vec<Document>,
    dirty: bool,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            dirty: false,
        }
    }

    /// Rebuild a store from a previously persisted collection.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            dirty: false,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether the collection has un-persisted changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after the collection has been persisted.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Create a document owned by `user_id`. A blank owner is a caller error.
    /// A `parent` that does not exist is a data error: nothing is created and
    /// `Ok(None)` is returned.
    pub fn create(
        &mut self,
        user_id: &str,
        title: &str,
        parent: Option<Uuid>,
    ) -> Result<Option<Document>> {
        if user_id.trim().is_empty() {
            return Err(anyhow!("user id is required"));
        }
        if let Some(parent_id) = parent {
            if self.get(parent_id).is_none() {
                return Ok(None);
            }
        }
        let doc = Document::new(user_id, title, parent);
        self.documents.push(doc.clone());
        self.dirty = true;
        Ok(Some(doc))
    }

    pub fn get(&self, id: Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// All documents owned by `user_id`, hiding archived ones unless asked
    /// for. A blank owner is a caller error, distinct from an empty result.
    pub fn list_by_owner(&self, user_id: &str, include_archived: bool) -> Result<Vec<Document>> {
        if user_id.trim().is_empty() {
            return Err(anyhow!("user id is required"));
        }
        Ok(self
            .documents
            .iter()
            .filter(|d| d.user_id == user_id && (include_archived || !d.is_archived))
            .cloned()
            .collect())
    }

    /// Merge `patch` onto the document and refresh `updated_at`. Returns the
    /// updated record, or `None` for an unknown id.
    pub fn update(&mut self, id: Uuid, patch: &DocumentPatch) -> Option<Document> {
        let updated = {
            let doc = self.documents.iter_mut().find(|d| d.id == id)?;
            patch.apply(doc);
            doc.updated_at = next_timestamp(doc.updated_at);
            doc.clone()
        };
        self.dirty = true;
        Some(updated)
    }

    pub fn publish(&mut self, id: Uuid) -> Option<Document> {
        self.update(id, &DocumentPatch::new().published(true))
    }

    pub fn unpublish(&mut self, id: Uuid) -> Option<Document> {
        self.update(id, &DocumentPatch::new().published(false))
    }

    /// Un-archive a single document. Descendants archived by a cascade stay
    /// in the trash until restored individually.
    pub fn restore(&mut self, id: Uuid) -> Option<Document> {
        self.update(id, &DocumentPatch::new().archived(false))
    }

    /// Move the document and its entire subtree to the trash. Returns `false`
    /// for an unknown id.
    pub fn archive(&mut self, id: Uuid) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.archive_recursive(id);
        true
    }

    fn archive_recursive(&mut self, id: Uuid) {
        if let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) {
            doc.is_archived = true;
            doc.updated_at = next_timestamp(doc.updated_at);
        }
        self.dirty = true;
        for child in self.child_ids(id) {
            self.archive_recursive(child);
        }
    }

    /// Permanently remove the document and its entire subtree. Returns
    /// `false` for an unknown id.
    pub fn delete(&mut self, id: Uuid) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.delete_recursive(id);
        true
    }

    fn delete_recursive(&mut self, id: Uuid) {
        // Children must be located before the parent record is removed; the
        // traversal runs over back-references that vanish with the parent.
        for child in self.child_ids(id) {
            self.delete_recursive(child);
        }
        self.documents.retain(|d| d.id != id);
        self.dirty = true;
    }

    /// Direct children of `id`, re-evaluated against the live collection.
    pub fn child_ids(&self, id: Uuid) -> Vec<Uuid> {
        self.documents
            .iter()
            .filter(|d| d.parent_document_id == Some(id))
            .map(|d| d.id)
            .collect()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
