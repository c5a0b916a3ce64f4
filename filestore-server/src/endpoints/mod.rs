//! Contains all HTTP endpoint handlers.
//!
//! Use [`routes`] to create a router with all endpoints.

use axum::Router;

use crate::state::ServiceState;

mod buckets;
mod files;
pub mod health;

/// Creates a router with all endpoints. The API lives under `/v1`.
pub fn routes() -> Router<ServiceState> {
    let routes_v1 = Router::new()
        .merge(buckets::router())
        .merge(files::router());

    Router::new()
        .merge(health::router())
        .nest("/v1", routes_v1)
}
