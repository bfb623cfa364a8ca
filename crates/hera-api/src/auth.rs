//! # Authentication & Organization Scoping
//!
//! Bearer token middleware. Tokens carry the caller's roles and, optionally,
//! the one organization the caller is bound to:
//!
//! ```text
//! Bearer {roles}:{organization_id}:{secret}   roles comma separated, org may be empty
//! Bearer {secret}                             legacy format (platform admin)
//! ```
//!
//! Every authenticated request gets a [`CallerIdentity`] in its extensions.
//! Handlers call [`ensure_org_access`] once they know which organization the
//! request targets; a caller bound to another organization gets 403.

use axum::extract::Request;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hera_core::OrganizationId;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AppError;

/// Role granted to legacy tokens and to every caller when auth is disabled.
pub const PLATFORM_ADMIN: &str = "platform_admin";

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Roles, e.g. `owner`, `receptionist`, `accountant`.
    pub roles: Vec<String>,
    /// Organization the caller is bound to; `None` may act on any.
    pub organization_id: Option<OrganizationId>,
}

impl CallerIdentity {
    /// Unrestricted identity.
    pub fn platform_admin() -> Self {
        Self {
            roles: vec![PLATFORM_ADMIN.to_string()],
            organization_id: None,
        }
    }

    /// Whether the caller holds the platform admin role.
    pub fn is_platform_admin(&self) -> bool {
        self.has_role(PLATFORM_ADMIN)
    }

    /// Whether the caller holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Reject callers bound to a different organization than `org`.
pub fn ensure_org_access(caller: &CallerIdentity, org: &OrganizationId) -> Result<(), AppError> {
    match &caller.organization_id {
        Some(bound) if bound != org => {
            tracing::warn!(caller_org = %bound, requested_org = %org, "cross-organization access denied");
            Err(AppError::Forbidden(format!(
                "caller is not a member of organization {org}"
            )))
        }
        _ => Ok(()),
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Shared secret held in a zeroizing buffer.
#[derive(Clone)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a secret.
    pub fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Auth configuration injected into request extensions. `None` disables auth.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected secret.
    pub token: Option<SecretToken>,
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of secrets.
///
/// When lengths differ, performs a dummy comparison so the mismatch path
/// takes the same time as a same-length compare.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in format `{roles}:{organization_id}:{secret}` or
/// `{secret}` (legacy, platform admin).
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity::platform_admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [roles, org, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let roles: Vec<String> = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
            if roles.is_empty() {
                return Err("token must name at least one role".into());
            }

            let organization_id = if org.is_empty() {
                None
            } else {
                Some(
                    OrganizationId::parse(org)
                        .map_err(|e| format!("invalid organization_id in token: {e}"))?,
                )
            };

            Ok(CallerIdentity {
                roles,
                organization_id,
            })
        }
        _ => Err("invalid token format, expected {roles}:{organization_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the bearer token and inject the [`CallerIdentity`].
///
/// When `AuthConfig.token` is `None`, every request runs as platform admin.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let Some(expected) = expected else {
        request
            .extensions_mut()
            .insert(CallerIdentity::platform_admin());
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let result = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) => parse_bearer_token(provided.trim(), expected.as_str()),
            None => Err("authorization header must use Bearer scheme".to_string()),
        },
        None => Err("missing authorization header".to_string()),
    };

    match result {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            AppError::Unauthorized(msg).into_response()
        }
    }
}
