//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::MarketplaceConfig;
use crate::supabase::{self, AuthClient, StorageClient, SupabaseError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no per-request data: identity and
/// role are re-resolved on every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketplaceConfig,
    pool: PgPool,
    auth: AuthClient,
    storage: Option<StorageClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the hosted backend cannot be
    /// built.
    pub fn new(config: MarketplaceConfig, pool: PgPool) -> Result<Self, SupabaseError> {
        let http = supabase::http_client()?;
        let auth = AuthClient::new(http.clone(), &config.supabase);
        let storage = StorageClient::from_config(http, &config.supabase);

        if storage.is_none() {
            tracing::warn!("SUPABASE_SERVICE_ROLE_KEY not set; uploads and password reset disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                auth,
                storage,
            }),
        })
    }

    /// Get a reference to the marketplace configuration.
    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the auth provider client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Object storage client, absent without a service-role key.
    #[must_use]
    pub fn storage(&self) -> Option<&StorageClient> {
        self.inner.storage.as_ref()
    }
}
