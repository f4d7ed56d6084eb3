//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budget_lines;
pub mod documents;
pub mod funds;
pub mod health;
pub mod summary;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(budget_lines::routes())
        .merge(documents::routes())
        .merge(summary::routes())
        .merge(funds::routes())
}
