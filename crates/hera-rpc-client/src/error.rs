//! RPC client error types.

use serde::Deserialize;

/// Errors from stored-procedure calls.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// HTTP transport error.
    #[error("HTTP error calling {function}: {source}")]
    Http {
        /// Stored procedure name.
        function: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The database rejected the call.
    #[error("{function} failed ({status}): {message}")]
    Function {
        /// Stored procedure name.
        function: String,
        /// HTTP status returned by PostgREST.
        status: u16,
        /// Postgres or PostgREST error code, e.g. `P0001`, `PGRST202`.
        code: Option<String>,
        /// Error message, passed to callers verbatim.
        message: String,
        /// Extra detail from the procedure.
        details: Option<String>,
        /// Hint from the procedure.
        hint: Option<String>,
    },

    /// Request arguments could not be encoded.
    #[error("failed to serialize arguments for {function}: {source}")]
    Serialization {
        /// Stored procedure name.
        function: String,
        /// Encode error.
        source: serde_json::Error,
    },

    /// Response body is not JSON.
    #[error("failed to deserialize response from {function}: {source}")]
    Deserialization {
        /// Stored procedure name.
        function: String,
        /// Parse error.
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl RpcError {
    /// Build a [`RpcError::Function`] from a non-2xx PostgREST response body.
    ///
    /// PostgREST answers with `{code, message, details, hint}`; anything else
    /// is kept as the message.
    pub(crate) fn from_response(function: &str, status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct PostgrestError {
            #[serde(default)]
            code: Option<String>,
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            details: Option<String>,
            #[serde(default)]
            hint: Option<String>,
        }

        match serde_json::from_str::<PostgrestError>(body) {
            Ok(err) if err.message.is_some() => Self::Function {
                function: function.to_string(),
                status,
                code: err.code,
                message: err.message.unwrap_or_default(),
                details: err.details,
                hint: err.hint,
            },
            _ => {
                let trimmed = body.trim();
                Self::Function {
                    function: function.to_string(),
                    status,
                    code: None,
                    message: if trimmed.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        trimmed.to_string()
                    },
                    details: None,
                    hint: None,
                }
            }
        }
    }
}
