use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::response::ApiSuccess;
use crate::docs::ApiDoc;
use crate::modules::video::model::Resolution;
use crate::state::AppState;

pub fn configure_routes(state: AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health))
        .merge(crate::modules::video::router(state));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .layer(cors)
}

#[derive(Serialize)]
struct Health {
    target_resolutions: Vec<Resolution>,
}

async fn health(State(state): State<AppState>) -> ApiSuccess<Health> {
    ApiSuccess::ok(
        Health {
            target_resolutions: state.lifecycle.resolutions().to_vec(),
        },
        "ok",
    )
}
