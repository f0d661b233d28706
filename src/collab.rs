//! Binding types for the collaboration layer. Presence and comments are
//! keyed by document id plus a user profile; nothing here touches the
//! document collection itself.

use serde::Serialize;
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::storage::Document;

pub const DEFAULT_ORGANIZATION: &str = "default-org";

const PRESENCE_COLORS: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9",
];

/// Profile handed to the collaboration layer when identifying a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabProfile {
    pub user_id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub photo_url: String,
    pub color: String,
}

impl CollabProfile {
    pub fn for_user(user: &UserIdentity) -> Self {
        let name = if user.name.trim().is_empty() {
            "Anonymous User".to_string()
        } else {
            user.name.clone()
        };
        Self {
            user_id: user.id.clone(),
            organization_id: DEFAULT_ORGANIZATION.to_string(),
            name,
            email: user.email.clone(),
            photo_url: user.image_url.clone().unwrap_or_default(),
            color: color_for_user(&user.id).to_string(),
        }
    }

    /// Placeholder profile for the signed-out state.
    pub fn anonymous() -> Self {
        Self {
            user_id: "temp-user".to_string(),
            organization_id: "temp-org".to_string(),
            name: "Anonymous User".to_string(),
            email: String::new(),
            photo_url: String::new(),
            color: "#808080".to_string(),
        }
    }
}

/// Stable handle the collaboration layer keys presence and comments on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBinding {
    pub document_id: Uuid,
    pub title: String,
}

impl DocumentBinding {
    pub fn for_document(doc: &Document) -> Self {
        Self {
            document_id: doc.id,
            title: doc.title.clone(),
        }
    }
}

/// Deterministic presence color for a user id, stable across sessions.
pub fn color_for_user(user_id: &str) -> &'static str {
    let mut hash: i32 = 0;
    for unit in user_id.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    PRESENCE_COLORS[hash.unsigned_abs() as usize % PRESENCE_COLORS.len()]
}
