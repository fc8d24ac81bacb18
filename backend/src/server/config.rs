//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use academy_backend::config::{AppSettings, SettingsError};
use academy_backend::inbound::http::health::StorageBackend;
use academy_backend::inbound::http::state::WebhookVerifiers;
use academy_backend::inbound::http::webhook_signature::WebhookVerifier;
use academy_backend::outbound::persistence::{
    DbPool, MigrationError, PoolConfig, PoolError, run_pending_migrations,
};
use tracing::{info, warn};

/// Startup failures that stop the process before it binds.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl From<StartupError> for std::io::Error {
    fn from(err: StartupError) -> Self {
        std::io::Error::other(err.to_string())
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) webhooks: WebhookVerifiers,
    pub(crate) checkout_base_url: String,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        webhooks: WebhookVerifiers,
        checkout_base_url: String,
    ) -> Self {
        Self {
            bind_addr,
            webhooks,
            checkout_base_url,
            db_pool: None,
        }
    }

    /// Attach a database connection pool; repositories switch to Diesel.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Resolve settings into a server configuration, opening the pool and
    /// applying migrations when a database URL is configured.
    ///
    /// # Errors
    ///
    /// [`StartupError`] when a setting is malformed, the pool cannot be
    /// built, or migrations fail.
    pub async fn from_settings(mut settings: AppSettings) -> Result<Self, StartupError> {
        let tolerance = settings.webhook_tolerance_secs();
        let webhooks = WebhookVerifiers {
            payments: WebhookVerifier::new(settings.payment_webhook_secret.as_deref(), tolerance),
            identity: WebhookVerifier::new(settings.identity_webhook_secret.as_deref(), tolerance),
        };
        if !webhooks.payments.is_configured() {
            warn!("no payment webhook secret configured; payment webhooks will be rejected");
        }
        let config = Self::new(settings.bind_addr()?, webhooks, settings.checkout_base_url()?);

        let Some(database_url) = settings.database_url.clone() else {
            warn!("no database_url configured; serving from the in-memory store");
            settings.wipe_secrets();
            return Ok(config);
        };

        if settings.run_migrations() {
            run_pending_migrations(database_url.clone()).await?;
        } else {
            info!("skipping database migrations");
        }
        let pool_config = PoolConfig::new(database_url)
            .with_max_size(settings.db_max_connections())
            .with_min_idle(Some(settings.db_min_idle()))
            .with_connection_timeout(settings.db_connect_timeout());
        settings.wipe_secrets();
        let pool = DbPool::new(pool_config).await?;
        Ok(config.with_db_pool(pool))
    }

    /// Storage backend the repositories will use.
    #[must_use]
    pub fn storage_backend(&self) -> StorageBackend {
        if self.db_pool.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
