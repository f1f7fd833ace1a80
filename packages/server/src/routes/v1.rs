use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/identifications", identification_routes())
        .route(
            "/search",
            get(handlers::identification::search_identifications),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn identification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::identification::list_identifications)
                .post(handlers::identification::identify),
        )
        .route("/{id}", get(handlers::identification::get_identification))
        .route(
            "/{id}/image",
            get(handlers::identification::get_identification_image),
        )
        .layer(handlers::identification::upload_body_limit())
}
