//! # hera-rpc-client -- Typed Rust client for the HERA stored procedures
//!
//! All business rules of the universal schema live in Postgres functions
//! exposed by PostgREST. This crate is the only path from the gateway to
//! those functions:
//!
//! - **Entities** via `hera_entity_upsert_v1`, `hera_entity_read_v1`,
//!   `hera_entity_delete_v1`
//! - **Dynamic data** via `hera_dynamic_data_set_v1`, `hera_dynamic_data_get_v1`
//! - **Relationships** via `hera_relationship_upsert_v1` and its batch variant
//! - **Transactions** via `hera_txn_emit_v1`, `hera_txn_emit_batch_v1`,
//!   `hera_txn_read_v1`
//!
//! ## Wire Convention
//!
//! `POST {SUPABASE_URL}/rest/v1/rpc/{function}` with a JSON object of
//! `p_`-prefixed named arguments. Every request carries the service key as
//! both `apikey` and bearer token. Results are returned as raw JSON; the
//! gateway passes them through.

pub mod config;
pub mod dynamic_data;
pub mod entities;
pub mod error;
pub mod relationships;
pub(crate) mod retry;
pub mod transactions;

pub use config::RpcConfig;
pub use error::RpcError;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use config::ConfigError;

/// Shared HTTP transport used by every sub-client.
#[derive(Debug, Clone)]
pub(crate) struct Rpc {
    http: reqwest::Client,
    rpc_base: Url,
}

impl Rpc {
    /// Call `function` with `params` serialized as the JSON body.
    pub(crate) async fn call<P: Serialize + ?Sized>(
        &self,
        function: &str,
        params: &P,
    ) -> Result<Value, RpcError> {
        let url = self
            .rpc_base
            .join(function)
            .map_err(|e| ConfigError::InvalidUrl(function.to_string(), e.to_string()))?;

        let started = std::time::Instant::now();
        let resp = retry::retry_send(function, || self.http.post(url.clone()).json(params).send())
            .await
            .map_err(|e| RpcError::Http {
                function: function.into(),
                source: e,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| RpcError::Http {
            function: function.into(),
            source: e,
        })?;
        tracing::debug!(
            function,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RPC call completed"
        );

        if !status.is_success() {
            return Err(RpcError::from_response(function, status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RpcError::Deserialization {
            function: function.into(),
            source: e,
        })
    }
}

/// Top-level RPC client. Holds sub-clients for each table family.
#[derive(Debug, Clone)]
pub struct HeraClient {
    rpc: Rpc,
    rest_base: Url,
    entities: entities::EntityClient,
    dynamic_data: dynamic_data::DynamicDataClient,
    relationships: relationships::RelationshipClient,
    transactions: transactions::TransactionClient,
}

impl HeraClient {
    /// Create a new client from configuration.
    pub fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers(&config)?)
            .build()
            .map_err(|e| RpcError::Http {
                function: "client_init".into(),
                source: e,
            })?;

        let rpc = Rpc {
            http,
            rpc_base: config.rpc_base()?,
        };
        Ok(Self {
            entities: entities::EntityClient::new(rpc.clone()),
            dynamic_data: dynamic_data::DynamicDataClient::new(rpc.clone()),
            relationships: relationships::RelationshipClient::new(rpc.clone()),
            transactions: transactions::TransactionClient::new(rpc.clone()),
            rest_base: config.rest_base()?,
            rpc,
        })
    }

    /// Access the entities client.
    pub fn entities(&self) -> &entities::EntityClient {
        &self.entities
    }

    /// Access the dynamic data client.
    pub fn dynamic_data(&self) -> &dynamic_data::DynamicDataClient {
        &self.dynamic_data
    }

    /// Access the relationships client.
    pub fn relationships(&self) -> &relationships::RelationshipClient {
        &self.relationships
    }

    /// Access the transactions client.
    pub fn transactions(&self) -> &transactions::TransactionClient {
        &self.transactions
    }

    /// Call an arbitrary stored procedure.
    pub async fn call<P: Serialize + ?Sized>(
        &self,
        function: &str,
        params: &P,
    ) -> Result<Value, RpcError> {
        self.rpc.call(function, params).await
    }

    /// Probe the REST root. Any HTTP answer below 500 counts as reachable.
    pub async fn health_check(&self) -> Result<(), RpcError> {
        let resp = self
            .rpc
            .http
            .get(self.rest_base.clone())
            .send()
            .await
            .map_err(|e| RpcError::Http {
                function: "health_check".into(),
                source: e,
            })?;
        let status = resp.status();
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::from_response("health_check", status.as_u16(), &body));
        }
        Ok(())
    }
}

fn default_headers(config: &RpcConfig) -> Result<HeaderMap, ConfigError> {
    let mut apikey =
        HeaderValue::from_str(config.service_role_key.as_str()).map_err(|_| ConfigError::InvalidKey)?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key.as_str()))
        .map_err(|_| ConfigError::InvalidKey)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}
