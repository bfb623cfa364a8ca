//! # Application State
//!
//! Shared, read-only state handed to every handler via `State`:
//!
//! - **RPC client**: `None` when `SUPABASE_URL` / key are not configured;
//!   RPC-backed routes then answer 503.
//! - **Preset registry** and **navigation catalog**: loaded once at startup,
//!   from YAML files when configured, the embedded salon catalog otherwise.
//! - **Metrics**: the Prometheus registry, so handlers can count RPC outcomes.

use std::path::PathBuf;
use std::sync::Arc;

use hera_core::nav::navigation_from_path;
use hera_core::{default_navigation, NavItem, PresetError, PresetRegistry};
use hera_rpc_client::HeraClient;

use crate::auth::SecretToken;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimitConfig;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bearer secret. `None` disables authentication.
    pub auth_token: Option<SecretToken>,
    /// Per-organization rate limit.
    pub rate_limit: RateLimitConfig,
    /// YAML preset catalog replacing the embedded one.
    pub presets_path: Option<PathBuf>,
    /// YAML navigation catalog replacing the embedded one.
    pub nav_path: Option<PathBuf>,
    /// Mount `/metrics` and record request metrics.
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rate_limit", &self.rate_limit)
            .field("presets_path", &self.presets_path)
            .field("nav_path", &self.nav_path)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            rate_limit: RateLimitConfig::default(),
            presets_path: None,
            nav_path: None,
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables. Unparseable numbers
    /// fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_u64 = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let path = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        Self {
            port: get("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            auth_token: get("AUTH_TOKEN")
                .filter(|t| !t.is_empty())
                .map(SecretToken::new),
            rate_limit: RateLimitConfig {
                max_requests: parse_u64("HERA_RATE_LIMIT_MAX", defaults.rate_limit.max_requests),
                window_secs: parse_u64(
                    "HERA_RATE_LIMIT_WINDOW_SECS",
                    defaults.rate_limit.window_secs,
                ),
            },
            presets_path: path("HERA_PRESETS_PATH"),
            nav_path: path("HERA_NAV_PATH"),
            metrics_enabled: get("HERA_METRICS_ENABLED")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: AppConfig,
    /// Stored procedure client; `None` answers RPC routes with 503.
    pub client: Option<HeraClient>,
    /// Entity presets.
    pub registry: Arc<PresetRegistry>,
    /// Navigation catalog before role filtering.
    pub navigation: Arc<Vec<NavItem>>,
    /// Prometheus metrics.
    pub metrics: ApiMetrics,
}

impl AppState {
    /// Load presets and navigation as configured and assemble the state.
    pub fn with_config(config: AppConfig, client: Option<HeraClient>) -> Result<Self, PresetError> {
        let registry = match &config.presets_path {
            Some(path) => PresetRegistry::from_path(path)?,
            None => PresetRegistry::builtin()?,
        };
        let navigation = match &config.nav_path {
            Some(path) => navigation_from_path(path)?,
            None => default_navigation()?,
        };
        Ok(Self::from_parts(config, client, registry, navigation))
    }

    /// Assemble state from already loaded catalogs.
    pub fn from_parts(
        config: AppConfig,
        client: Option<HeraClient>,
        registry: PresetRegistry,
        navigation: Vec<NavItem>,
    ) -> Self {
        Self {
            config,
            client,
            registry: Arc::new(registry),
            navigation: Arc::new(navigation),
            metrics: ApiMetrics::new(),
        }
    }
}
