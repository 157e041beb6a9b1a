mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Versioned API; `lib::build_router` mounts it under `/api`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::router())
}
