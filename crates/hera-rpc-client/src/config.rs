//! RPC client configuration.
//!
//! The stored procedures are reached through the PostgREST endpoint of the
//! Supabase project. The service-role key authenticates every call and is
//! kept in a [`Zeroizing`] buffer.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for the PostgREST RPC endpoint.
///
/// Custom `Debug` implementation redacts the service key.
#[derive(Clone)]
pub struct RpcConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub supabase_url: Url,
    /// Service-role key sent as `apikey` and bearer token.
    pub service_role_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConfig")
            .field("supabase_url", &self.supabase_url)
            .field("service_role_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RpcConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SUPABASE_URL` (required)
    /// - `SUPABASE_SERVICE_ROLE_KEY` (required)
    /// - `HERA_RPC_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var("SUPABASE_URL").map_err(|_| ConfigError::MissingUrl)?;
        let supabase_url = parse_url("SUPABASE_URL", &raw_url)?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map(Zeroizing::new)
            .map_err(|_| ConfigError::MissingKey)?;
        if service_role_key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(Self {
            supabase_url,
            service_role_key,
            timeout_secs: std::env::var("HERA_RPC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(port: u16, key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            supabase_url: parse_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            service_role_key: Zeroizing::new(key.to_string()),
            timeout_secs: 5,
        })
    }

    /// Base URL of the RPC endpoint, always ending in `/rest/v1/rpc/`.
    pub fn rpc_base(&self) -> Result<Url, ConfigError> {
        self.rest_base()?
            .join("rpc/")
            .map_err(|e| ConfigError::InvalidUrl("SUPABASE_URL".into(), e.to_string()))
    }

    /// Base URL of the REST endpoint, always ending in `/rest/v1/`.
    pub fn rest_base(&self) -> Result<Url, ConfigError> {
        let mut base = self.supabase_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("rest/v1/")
            .map_err(|e| ConfigError::InvalidUrl("SUPABASE_URL".into(), e.to_string()))
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `SUPABASE_URL` is not set.
    #[error("SUPABASE_URL environment variable is required")]
    MissingUrl,
    /// `SUPABASE_SERVICE_ROLE_KEY` is not set or blank.
    #[error("SUPABASE_SERVICE_ROLE_KEY environment variable is required")]
    MissingKey,
    /// The key contains bytes that cannot appear in an HTTP header.
    #[error("SUPABASE_SERVICE_ROLE_KEY is not a valid header value")]
    InvalidKey,
    /// A URL failed to parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
