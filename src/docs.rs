use utoipa::OpenApi;
use crate::modules::video::dto::*;
use crate::modules::video::model::{Access, Genre, Resolution, Video};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::create_video,
        crate::modules::video::handler::list_videos,
        crate::modules::video::handler::list_user_videos,
        crate::modules::video::handler::get_video,
        crate::modules::video::handler::delete_video,
        crate::modules::video::handler::get_video_thumbnail,
        crate::modules::video::stream_handler::stream_video,
        crate::modules::video::stream_handler::stream_video_resolution,
    ),
    components(
        schemas(
            CreateVideoForm, VideoResponse, Video, Genre, Access, Resolution,
        )
    ),
    tags(
        (name = "Videos", description = "Video upload, listing and streaming")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
