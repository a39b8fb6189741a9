use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod error;
pub mod events;
pub mod handler;
pub mod lifecycle;
pub mod memory;
pub mod model;
pub mod paths;
pub mod repository;
pub mod service;
pub mod stream_handler;
pub mod transcoder;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let public_routes = Router::new()
        .route("/videos", get(handler::list_videos))
        .route("/videos/{id}", get(handler::get_video))
        .route("/videos/{id}/thumbnail", get(handler::get_video_thumbnail))
        .route("/videos/{id}/stream", get(stream_handler::stream_video))
        .route("/videos/{id}/stream/{resolution}", get(stream_handler::stream_video_resolution))
        .route("/users/{user_id}/videos", get(handler::list_user_videos))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::optional_auth_middleware,
        ));

    let protected_routes = Router::new()
        .route("/videos", post(handler::create_video))
        .route("/videos/{id}", axum::routing::delete(handler::delete_video))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ));

    public_routes.merge(protected_routes)
}
