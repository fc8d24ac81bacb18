//! Runtime settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ACADEMY_*` environment variables and config
//! files, in increasing order of precedence as OrthoConfig defines it.
//! Unset values fall back to the defaults exposed by the accessors below.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroize;

use crate::inbound::http::webhook_signature::DEFAULT_TOLERANCE_SECS;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_IDLE: u32 = 2;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CHECKOUT_BASE_URL: &str = "https://checkout.example.test";

/// Raised when a setting is present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("bind_addr {value:?} is not a socket address")]
    InvalidBindAddr { value: String },
    #[error("checkout_base_url {value:?} is not an absolute URL")]
    InvalidCheckoutUrl { value: String },
}

/// Server settings.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACADEMY")]
pub struct AppSettings {
    /// Listen address, `host:port`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub db_min_idle: Option<u32>,
    pub db_connect_timeout_secs: Option<u64>,
    /// Apply embedded migrations at startup; defaults to true.
    pub run_migrations: Option<bool>,
    /// Shared secret for the payment processor webhook.
    pub payment_webhook_secret: Option<String>,
    /// Shared secret for the identity provider webhook.
    pub identity_webhook_secret: Option<String>,
    pub webhook_tolerance_secs: Option<u64>,
    /// Base of the hosted checkout pages handed out by the local gateway.
    pub checkout_base_url: Option<String>,
}

impl AppSettings {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn db_min_idle(&self) -> u32 {
        self.db_min_idle.unwrap_or(DEFAULT_MIN_IDLE)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.db_connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    pub fn webhook_tolerance_secs(&self) -> u64 {
        self.webhook_tolerance_secs.unwrap_or(DEFAULT_TOLERANCE_SECS)
    }

    /// Checkout base URL, validated as an absolute URL.
    pub fn checkout_base_url(&self) -> Result<String, SettingsError> {
        let raw = self
            .checkout_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CHECKOUT_BASE_URL);
        match url::Url::parse(raw) {
            Ok(parsed) if parsed.has_host() => Ok(raw.trim_end_matches('/').to_owned()),
            _ => Err(SettingsError::InvalidCheckoutUrl {
                value: raw.to_owned(),
            }),
        }
    }

    /// Overwrite the database URL and webhook secrets in place once the
    /// pool and verifiers have taken their own copies.
    pub fn wipe_secrets(&mut self) {
        self.database_url.zeroize();
        self.payment_webhook_secret.zeroize();
        self.identity_webhook_secret.zeroize();
    }
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &redact(&self.database_url))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_idle", &self.db_min_idle)
            .field("db_connect_timeout_secs", &self.db_connect_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .field("payment_webhook_secret", &redact(&self.payment_webhook_secret))
            .field("identity_webhook_secret", &redact(&self.identity_webhook_secret))
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("checkout_base_url", &self.checkout_base_url)
            .finish()
    }
}
