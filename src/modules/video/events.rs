use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::model::Resolution;

/// One resolution of one source. Fire-and-forget: nothing is recorded about
/// its fate except the derived file appearing on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub source_path: PathBuf, // absolute
    pub resolution: Resolution,
}

impl TranscodeJob {
    pub fn new(source_path: impl Into<PathBuf>, resolution: Resolution) -> Self {
        Self {
            source_path: source_path.into(),
            resolution,
        }
    }
}
