use crate::config::Config;
use crate::crypto::digest_codec::DigestCodec;
use crate::crypto::hmac_codec::HmacCodec;
use crate::error::Result;
use crate::repositories::user::UserStore;
use crate::services::auth as auth_service;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Where user accounts live.
    pub users: UserStore,
    /// The application's configuration.
    pub config: Config,
    /// Session codec used by the full-runtime auth guard and the auth handlers.
    pub sessions: HmacCodec,
    /// Session codec used by the gateway that runs before routing.
    pub edge_sessions: DigestCodec,
}

impl AppState {
    /// Creates a new `AppState`, connecting to PostgreSQL when configured.
    ///
    /// Without `DATABASE_URL` the in-memory store is used and seeded with the
    /// demo account.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let users = match config.database_url.as_deref() {
            Some(url) => {
                let pool = crate::db::create_pool(url)?;
                tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");
                UserStore::Postgres(pool)
            }
            None => {
                let store = UserStore::memory();
                auth_service::seed_demo_user(&store).await?;
                tracing::warn!("⚠️ DATABASE_URL not set, using the in-memory user store");
                store
            }
        };

        Ok(Self::with_store(config, users))
    }

    /// Creates an `AppState` around an existing user store.
    pub fn with_store(config: &Config, users: UserStore) -> Self {
        let sessions = HmacCodec::new(config.session_secret.clone());
        let edge_sessions = DigestCodec::new(config.session_secret.clone());
        tracing::info!("✅ Session codecs initialized");

        AppState {
            users,
            config: config.clone(),
            sessions,
            edge_sessions,
        }
    }
}
