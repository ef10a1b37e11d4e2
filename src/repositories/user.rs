use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use deadpool_postgres::Pool;
use tokio::sync::RwLock;
use tokio_postgres::{error::SqlState, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::{NewUser, User},
};

/// Where user accounts live.
///
/// `Memory` exists for local development without a database and is refused
/// in production by `Config::from_env`.
#[derive(Clone)]
pub enum UserStore {
    Postgres(Pool),
    Memory(Arc<RwLock<HashMap<Uuid, User>>>),
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        password_hash: row.try_get("password_hash").map_err(|_| AppError::MissingData("password_hash".to_string()))?,
        name: row.try_get("name").map_err(|_| AppError::MissingData("name".to_string()))?,
        avatar_color: row.try_get("avatar_color").map_err(|_| AppError::MissingData("avatar_color".to_string()))?,
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
    })
}

fn duplicate_email() -> AppError {
    AppError::Conflict("An account with this email already exists".to_string())
}

impl UserStore {
    /// Creates an empty in-memory store.
    pub fn memory() -> Self {
        UserStore::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Creates a new user.
    ///
    /// # Returns
    ///
    /// The stored `User`, or `AppError::Conflict` when the email is taken.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        match self {
            UserStore::Postgres(pool) => {
                let client = pool.get().await?;
                let row = client
                    .query_one(
                        r#"
                        INSERT INTO users (id, email, password_hash, name, avatar_color)
                        VALUES ($1, $2, $3, $4, $5)
                        RETURNING id, email, password_hash, name, avatar_color, created_at
                        "#,
                        &[
                            &Uuid::new_v4(),
                            &new_user.email,
                            &new_user.password_hash,
                            &new_user.name,
                            &new_user.avatar_color,
                        ],
                    )
                    .await
                    .map_err(|e| {
                        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                            duplicate_email()
                        } else {
                            AppError::Database(e)
                        }
                    })?;
                row_to_user(&row)
            }
            UserStore::Memory(users) => {
                let mut users = users.write().await;
                if users.values().any(|u| u.email == new_user.email) {
                    return Err(duplicate_email());
                }
                let user = User {
                    id: Uuid::new_v4(),
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                    name: new_user.name,
                    avatar_color: new_user.avatar_color,
                    created_at: Utc::now(),
                };
                users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    /// Finds a user by their normalized email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        match self {
            UserStore::Postgres(pool) => {
                let client = pool.get().await?;
                let row = client
                    .query_opt(
                        r#"
                        SELECT id, email, password_hash, name, avatar_color, created_at
                        FROM users
                        WHERE email = $1
                        "#,
                        &[&email],
                    )
                    .await?;
                row.map(|r| row_to_user(&r)).transpose()
            }
            UserStore::Memory(users) => Ok(users
                .read()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned()),
        }
    }

    /// Finds a user by their ID.
    pub async fn find_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        match self {
            UserStore::Postgres(pool) => {
                let client = pool.get().await?;
                let row = client
                    .query_opt(
                        r#"
                        SELECT id, email, password_hash, name, avatar_color, created_at
                        FROM users
                        WHERE id = $1
                        "#,
                        &[user_id],
                    )
                    .await?;
                row.map(|r| row_to_user(&r)).transpose()
            }
            UserStore::Memory(users) => Ok(users.read().await.get(user_id).cloned()),
        }
    }

    /// Updates a user's password hash.
    pub async fn update_password(&self, user_id: &Uuid, password_hash: String) -> Result<()> {
        match self {
            UserStore::Postgres(pool) => {
                let client = pool.get().await?;
                let updated = client
                    .execute(
                        r#"
                        UPDATE users
                        SET password_hash = $1
                        WHERE id = $2
                        "#,
                        &[&password_hash, user_id],
                    )
                    .await?;
                if updated == 0 {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
                Ok(())
            }
            UserStore::Memory(users) => {
                let mut users = users.write().await;
                let user = users
                    .get_mut(user_id)
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
                user.password_hash = password_hash;
                Ok(())
            }
        }
    }
}
