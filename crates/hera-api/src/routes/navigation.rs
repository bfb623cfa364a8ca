//! Navigation catalog filtered by the caller's roles.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use hera_core::{filter_nav_by_role, NavItem};

use crate::auth::CallerIdentity;
use crate::state::AppState;

/// Navigation routes (v2 only).
pub fn router() -> Router<AppState> {
    Router::new().route("/navigation", get(navigation))
}

/// GET /api/v2/navigation: entries visible to the caller.
///
/// Platform admins see the whole catalog.
#[utoipa::path(
    get,
    path = "/api/v2/navigation",
    responses((status = 200, description = "Navigation entries visible to the caller")),
    tag = "navigation"
)]
pub async fn navigation(State(state): State<AppState>, caller: CallerIdentity) -> Json<Vec<NavItem>> {
    if caller.is_platform_admin() {
        return Json(state.navigation.as_ref().clone());
    }
    Json(filter_nav_by_role(&state.navigation, &caller.roles))
}
