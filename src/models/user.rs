use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A stored login credential. Usernames are unique; uniqueness is enforced by
/// the existence check in the store, not by the backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl Credential {
    /// The authentication check: does the submitted password match the
    /// stored hash? A malformed stored hash counts as a mismatch.
    pub fn verify_password(&self, submitted: &str) -> bool {
        bcrypt::verify(submitted, &self.password_hash).unwrap_or(false)
    }
}

/// The logged-in identity held in the tower-session. Handlers pass this
/// explicitly into any filtering that depends on who is asking; the engine
/// never reads ambient session state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
