use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The avatar colour given to users who do not pick one.
pub const DEFAULT_AVATAR_COLOR: &str = "#6366f1";

/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user. Also the session token subject.
    pub id: Uuid,
    /// The user's email address, trimmed and lower-cased.
    pub email: String,
    /// The user's Argon2id password hash.
    pub password_hash: String,
    /// The user's display name.
    pub name: String,
    /// The user's avatar colour.
    pub avatar_color: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

/// The fields needed to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub avatar_color: String,
}

/// The user fields safe to return to clients.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_color: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_color: user.avatar_color.clone(),
        }
    }
}

/// The authenticated user, inserted into request extensions by the auth guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}
