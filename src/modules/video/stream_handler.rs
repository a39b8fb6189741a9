use crate::common::response::ApiError;
use crate::middleware::auth::TokenClaims;
use crate::modules::video::model::Resolution;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use axum_extra::headers::Range;
use axum_extra::TypedHeader;
use axum_range::{KnownSize, Ranged};
use uuid::Uuid;

/// Stream the uploaded source with support for Range requests
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/stream",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Stream Content"),
        (status = 206, description = "Partial Content"),
        (status = 404, description = "Not Found")
    ),
    tag = "Videos"
)]
pub async fn stream_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    claims: Option<Extension<TokenClaims>>,
    range: Option<TypedHeader<Range>>,
) -> impl IntoResponse {
    serve(state, id, None, claims, range).await
}

/// Stream one transcoded resolution. 404 until its job has produced the file.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/stream/{resolution}",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("resolution" = String, Path, description = "480p, 720p or 1080p")
    ),
    responses(
        (status = 200, description = "Stream Content"),
        (status = 206, description = "Partial Content"),
        (status = 404, description = "Not Found")
    ),
    tag = "Videos"
)]
pub async fn stream_video_resolution(
    State(state): State<AppState>,
    Path((id, resolution)): Path<(Uuid, String)>,
    claims: Option<Extension<TokenClaims>>,
    range: Option<TypedHeader<Range>>,
) -> impl IntoResponse {
    let resolution = match resolution.parse::<Resolution>() {
        Ok(r) => r,
        Err(e) => return ApiError::not_found(e.to_string()).into_response(),
    };
    serve(state, id, Some(resolution), claims, range).await
}

async fn serve(
    state: AppState,
    id: Uuid,
    resolution: Option<Resolution>,
    claims: Option<Extension<TokenClaims>>,
    range: Option<TypedHeader<Range>>,
) -> axum::response::Response {
    let requester = claims.map(|Extension(c)| c.sub);
    let path = match VideoService::stream_path(state, requester, id, resolution).await {
        Ok(path) => path,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let body = match KnownSize::file(file).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Failed to stat {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = mime_guess::from_path(&path).first_or(mime_guess::mime::APPLICATION_OCTET_STREAM);
    let range = range.map(|TypedHeader(range)| range);

    (
        [(header::CONTENT_TYPE, content_type.to_string())],
        Ranged::new(range, body),
    )
        .into_response()
}
