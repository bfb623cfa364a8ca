//! Smart code validation endpoint for form builders and importers.

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use hera_core::{SmartCode, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Smart code routes (v2 only).
pub fn router() -> Router<AppState> {
    Router::new().route("/smart-codes/validate", post(validate_smart_code))
}

/// Body of `POST /smart-codes/validate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SmartCodeRequest {
    /// Candidate smart code.
    pub smart_code: String,
}

/// Verdict for a candidate smart code.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SmartCodeVerdict {
    /// The input, unchanged.
    pub smart_code: String,
    /// Whether it is well formed.
    pub valid: bool,
    /// Broken rule, when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Domain segment, when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Version number, when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl SmartCodeVerdict {
    fn of(raw: String) -> Self {
        match SmartCode::parse(raw.as_str()) {
            Ok(code) => Self {
                domain: Some(code.domain().to_string()),
                version: Some(code.version()),
                smart_code: raw,
                valid: true,
                reason: None,
            },
            Err(err) => {
                let reason = match err {
                    ValidationError::InvalidSmartCode { reason, .. } => reason,
                    other => other.to_string(),
                };
                Self {
                    smart_code: raw,
                    valid: false,
                    reason: Some(reason),
                    domain: None,
                    version: None,
                }
            }
        }
    }
}

/// POST /api/v2/smart-codes/validate: check a smart code's format.
///
/// Always 200 for a well-formed request; `valid` carries the verdict.
#[utoipa::path(
    post,
    path = "/api/v2/smart-codes/validate",
    request_body = SmartCodeRequest,
    responses(
        (status = 200, description = "Verdict", body = SmartCodeVerdict),
        (status = 400, description = "Body is not `{ smart_code }`", body = crate::error::ErrorBody),
    ),
    tag = "smart-codes"
)]
pub async fn validate_smart_code(
    body: Result<Json<SmartCodeRequest>, JsonRejection>,
) -> Result<Json<SmartCodeVerdict>, AppError> {
    let req = extract_json(body)?;
    Ok(Json(SmartCodeVerdict::of(req.smart_code)))
}
