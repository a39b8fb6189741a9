use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::model::{Access, Genre, Video};

fn validate_genre(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Genre>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("genre").with_message("Unknown genre".into()))
}

fn validate_access(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Access>()
        .map(|_| ())
        .map_err(|_| {
            ValidationError::new("access").with_message("Access must be public or private".into())
        })
}

/// Text fields of the upload form. The file itself is streamed separately.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateVideoForm {
    #[validate(length(min = 1, max = 50, message = "Title must be 1 to 50 characters"))]
    pub title: String,
    #[validate(length(max = 150, message = "Description must be at most 150 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_genre"))]
    pub genre: String,
    #[validate(custom(function = "validate_access"))]
    pub access: String,
}

impl CreateVideoForm {
    /// Accepts one multipart text field; unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value.trim().to_string(),
            "description" => self.description = value.trim().to_string(),
            "genre" => self.genre = value,
            "access" => self.access = value,
            _ => {}
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    pub video: Video,
    pub thumbnail_url: Option<String>,
    /// Present only once the corresponding transcode has produced its file.
    pub video_480p_url: Option<String>,
    pub video_720p_url: Option<String>,
    pub video_1080p_url: Option<String>,
}
