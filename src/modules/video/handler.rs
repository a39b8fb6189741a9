use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::stream_to_disk;
use crate::middleware::auth::TokenClaims;
use crate::modules::video::dto::*;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

fn requester(claims: &Option<Extension<TokenClaims>>) -> Option<Uuid> {
    claims.as_ref().map(|Extension(c)| c.sub)
}

/// Upload a video
/// Multipart form with `title`, `description`, `genre`, `access` and the `video` file.
/// The thumbnail is generated before responding; transcodes run in the background.
#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video Created", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut form = CreateVideoForm::default();
    let mut stored: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&state, stored.as_deref()).await;
                return ApiError::bad_request(format!("Malformed multipart body: {}", e))
                    .into_response();
            }
        };
        let name = field.name().unwrap_or("").to_string();

        if name == "video" {
            if stored.is_some() {
                discard(&state, stored.as_deref()).await;
                return ApiError::bad_request("Only one video file per upload")
                    .into_response();
            }

            let file_name = field.file_name().unwrap_or("video.mp4").to_string();
            info!("Starting upload for user {}: {}", claims.sub, file_name);

            // The name is checked before a single byte is written.
            let (relative, file) = match state.storage.reserve_upload(&file_name).await {
                Ok(reserved) => reserved,
                Err(e) => return ApiError::from(super::error::VideoError::from(e)).into_response(),
            };
            let absolute = state.storage.absolute(&relative);

            if let Err(e) = stream_to_disk(field, file, &absolute).await {
                discard(&state, stored.as_deref()).await;
                return ApiError::bad_request(format!("Upload failed: {}", e)).into_response();
            }
            stored = Some(relative);
        } else {
            match field.text().await {
                Ok(value) => form.set_field(&name, value),
                Err(e) => {
                    discard(&state, stored.as_deref()).await;
                    return ApiError::bad_request(format!("Invalid field {}: {}", name, e))
                        .into_response();
                }
            }
        }
    }

    let Some(source_path) = stored else {
        return ApiError::bad_request("No video field found in multipart request")
            .into_response();
    };

    match VideoService::create_video(state, claims.sub, form, source_path).await {
        Ok(res) => ApiSuccess::created(res, "Video created successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn discard(state: &AppState, relative: Option<&str>) {
    if let Some(relative) = relative {
        let _ = tokio::fs::remove_file(state.storage.absolute(relative)).await;
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    responses(
        (status = 200, description = "Videos visible to the requester", body = ApiResponse<Vec<VideoResponse>>),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    claims: Option<Extension<TokenClaims>>,
) -> impl IntoResponse {
    match VideoService::list_videos(state, requester(&claims), None).await {
        Ok(res) => ApiSuccess::ok(res, "Videos retrieved successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/videos",
    params(
        ("user_id" = Uuid, Path, description = "Owner ID")
    ),
    responses(
        (status = 200, description = "Videos of one owner visible to the requester", body = ApiResponse<Vec<VideoResponse>>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn list_user_videos(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    claims: Option<Extension<TokenClaims>>,
) -> impl IntoResponse {
    match VideoService::list_videos(state, requester(&claims), Some(user_id)).await {
        Ok(res) => ApiSuccess::ok(res, "Videos retrieved successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Get Video", body = ApiResponse<VideoResponse>),
        (status = 404, description = "Video Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    claims: Option<Extension<TokenClaims>>,
) -> impl IntoResponse {
    match VideoService::get_video(state, requester(&claims), id).await {
        Ok(res) => ApiSuccess::ok(res, "Video retrieved successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Video Not Found")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match VideoService::delete_video(state, &claims, id).await {
        Ok(report) => {
            info!("Video {} deleted, {} file(s) removed", id, report.removed.len());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get Video Thumbnail
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/thumbnail",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Success", body = Vec<u8>),
        (status = 404, description = "Not Found")
    ),
    tag = "Videos"
)]
pub async fn get_video_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    claims: Option<Extension<TokenClaims>>,
) -> impl IntoResponse {
    let path = match VideoService::thumbnail_path(state, requester(&claims), id).await {
        Ok(path) => path,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to read thumbnail {}: {}", path.display(), e);
            ApiError::not_found("Thumbnail not found").into_response()
        }
    }
}
