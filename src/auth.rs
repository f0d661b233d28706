use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identity yielded by the authentication provider. `Document::user_id` is an
/// opaque foreign key into these identities; the store never validates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// In-memory session provider. Any non-blank credential pair signs in,
/// mirroring the demo auth flow the editor shell runs against.
#[derive(Default)]
pub struct SessionAuth {
    user: RwLock<Option<UserIdentity>>,
}

impl SessionAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Option<UserIdentity> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return None;
        }
        let user = UserIdentity {
            id: "user_123".to_string(),
            name: "Demo User".to_string(),
            email: email.to_string(),
            image_url: Some("/logo.svg".to_string()),
        };
        *self.user.write() = Some(user.clone());
        Some(user)
    }

    pub fn sign_out(&self) {
        *self.user.write() = None;
    }
}

impl AuthProvider for SessionAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.read().clone()
    }
}
