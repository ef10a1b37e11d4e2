use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::models::user::{NewUser, User, DEFAULT_AVATAR_COLOR};
use crate::repositories::user::UserStore;
use crate::validation::auth::normalize_email;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// The account seeded into the in-memory store for local development.
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-encoded hash.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Encryption(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Encryption(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
///
/// # Returns
///
/// A `Result` containing `true` if the password matches.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Encryption(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Creates a new account.
///
/// # Arguments
///
/// * `store` - The user store.
/// * `email` - The email address, normalized before storage.
/// * `password` - The plaintext password.
/// * `name` - The display name.
/// * `avatar_color` - The avatar colour, defaulted when absent.
///
/// # Returns
///
/// The created `User`, or `AppError::Conflict` when the email is taken.
pub async fn register_user(
    store: &UserStore,
    email: &str,
    password: &str,
    name: &str,
    avatar_color: Option<&str>,
) -> Result<User> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Creating user: {}", email);

    if store.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let user = store
        .create_user(NewUser {
            email,
            password_hash: hash_password(password)?,
            name: name.trim().to_string(),
            avatar_color: avatar_color
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_AVATAR_COLOR)
                .to_string(),
        })
        .await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Authenticates a user by email and password.
///
/// Unknown emails and wrong passwords fail with the same message.
pub async fn authenticate_user(store: &UserStore, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}

/// Changes a user's password after checking the current one.
///
/// Issued session tokens stay valid; they are not bound to the password.
pub async fn change_password(
    store: &UserStore,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    tracing::info!("🔑 Changing password for user: {}", user_id);

    let user = store
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "Current password is incorrect".to_string(),
        ));
    }

    store
        .update_password(&user_id, hash_password(new_password)?)
        .await?;

    tracing::info!("✅ Password changed for user: {}", user_id);
    Ok(())
}

/// Seeds the development demo account unless it already exists.
pub async fn seed_demo_user(store: &UserStore) -> Result<User> {
    if let Some(user) = store.find_by_email(DEMO_EMAIL).await? {
        return Ok(user);
    }
    let user = register_user(store, DEMO_EMAIL, DEMO_PASSWORD, "Test User", None).await?;
    tracing::info!("🌱 Seeded demo account {} / {}", DEMO_EMAIL, DEMO_PASSWORD);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips_and_rejects_wrong_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AppError::Encryption(_))
        ));
    }

    #[tokio::test]
    async fn register_normalizes_email_and_rejects_duplicates() {
        let store = UserStore::memory();
        let user = register_user(&store, " Cook@Example.com ", "secret1", " Ana ", None)
            .await
            .unwrap();
        assert_eq!(user.email, "cook@example.com");
        assert_eq!(user.name, "Ana");
        assert_eq!(user.avatar_color, DEFAULT_AVATAR_COLOR);

        let duplicate = register_user(&store, "COOK@example.com", "secret2", "Bo", None).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let store = UserStore::memory();
        let user = seed_demo_user(&store).await.unwrap();

        let wrong = change_password(&store, user.id, "nope", "newpass1").await;
        assert!(matches!(wrong, Err(AppError::Authentication(_))));

        change_password(&store, user.id, DEMO_PASSWORD, "newpass1").await.unwrap();
        assert!(authenticate_user(&store, DEMO_EMAIL, "newpass1").await.is_ok());
        assert!(authenticate_user(&store, DEMO_EMAIL, DEMO_PASSWORD).await.is_err());
    }
}
