mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{health, plans, searches};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/api/travel-plan", post(plans::travel_plan))
        .route(
            "/api/travel-plan-with-restaurants",
            post(plans::travel_plan_with_restaurants),
        )
        .route("/api/restaurant-search", post(searches::restaurant_search))
        .route("/api/saved-search", post(searches::saved_search))
        .route("/health", get(health::check))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(unexpected_error)
}
