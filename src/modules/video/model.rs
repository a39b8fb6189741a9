use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Action,
    Comedy,
    Documentary,
    Drama,
    Horror,
    Romance,
    Scifi,
    Thriller,
    Other,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Comedy => "comedy",
            Genre::Documentary => "documentary",
            Genre::Drama => "drama",
            Genre::Horror => "horror",
            Genre::Romance => "romance",
            Genre::Scifi => "scifi",
            Genre::Thriller => "thriller",
            Genre::Other => "other",
        }
    }
}

impl FromStr for Genre {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "action" => Ok(Genre::Action),
            "comedy" => Ok(Genre::Comedy),
            "documentary" => Ok(Genre::Documentary),
            "drama" => Ok(Genre::Drama),
            "horror" => Ok(Genre::Horror),
            "romance" => Ok(Genre::Romance),
            "scifi" => Ok(Genre::Scifi),
            "thriller" => Ok(Genre::Thriller),
            "other" => Ok(Genre::Other),
            _ => Err(ParseEnumError::new("genre", s)),
        }
    }
}

impl TryFrom<String> for Genre {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Private,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Private => "private",
        }
    }
}

impl FromStr for Access {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Access::Public),
            "private" => Ok(Access::Private),
            _ => Err(ParseEnumError::new("access level", s)),
        }
    }
}

impl TryFrom<String> for Access {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Target encoding preset. The label doubles as the derived file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Resolution {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::P480, Resolution::P720, Resolution::P1080];

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }

    /// ffmpeg frame size abbreviation passed to `-s`.
    pub fn preset(&self) -> &'static str {
        match self {
            Resolution::P480 => "hd480",
            Resolution::P720 => "hd720",
            Resolution::P1080 => "hd1080",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("resolution", s))
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Relative to the media root; fixed at creation.
    pub source_path: String,
    /// Relative to the media root; written once by the lifecycle hook.
    pub thumbnail_path: Option<String>,
    #[sqlx(try_from = "String")]
    pub genre: Genre,
    #[sqlx(try_from = "String")]
    pub access: Access,
    pub owner_id: Uuid,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
}

impl Video {
    /// Public videos are visible to everyone, private ones only to their owner.
    pub fn is_visible_to(&self, requester: Option<Uuid>) -> bool {
        match self.access {
            Access::Public => true,
            Access::Private => requester == Some(self.owner_id),
        }
    }
}

/// Everything the serving layer knows when it persists an upload.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub source_path: String,
    pub genre: Genre,
    pub access: Access,
    pub owner_id: Uuid,
}
