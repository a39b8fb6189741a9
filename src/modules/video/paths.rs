//! Naming of derived artifacts.
//!
//! Every derived file name (transcoded resolutions and thumbnails) is
//! computed here, both when writing and when deleting.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivationError {
    #[error("source path '{0}' has no file name")]
    MissingFileName(String),
    #[error("file name '{0}' is not valid UTF-8")]
    NonUtf8(String),
    #[error("file name '{0}' has no extension")]
    MissingExtension(String),
    #[error("invalid resolution label '{0}'")]
    InvalidLabel(String),
}

/// Splits a file name on its last dot into `(base, ext)`.
pub fn split_file_name(source: &Path) -> Result<(&str, &str), DerivationError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| DerivationError::MissingFileName(source.display().to_string()))?;
    let file_name = file_name
        .to_str()
        .ok_or_else(|| DerivationError::NonUtf8(file_name.to_string_lossy().into_owned()))?;

    match file_name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => Ok((base, ext)),
        _ => Err(DerivationError::MissingExtension(file_name.to_string())),
    }
}

fn validate_label(label: &str) -> Result<(), DerivationError> {
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DerivationError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// `<dir>/<base>.<ext>` becomes `<dir>/<base>_<label>.<ext>`.
pub fn derive(source: &Path, label: &str) -> Result<PathBuf, DerivationError> {
    validate_label(label)?;
    let (base, ext) = split_file_name(source)?;
    Ok(source.with_file_name(format!("{base}_{label}.{ext}")))
}

/// Thumbnails are named after the source base name: `<thumbnails_dir>/<base>.jpg`.
pub fn thumbnail_path(thumbnails_dir: &Path, source: &Path) -> Result<PathBuf, DerivationError> {
    let (base, _) = split_file_name(source)?;
    Ok(thumbnails_dir.join(format!("{base}.jpg")))
}

/// Checks that a source can be processed before anything is persisted.
pub fn validate_source<'a>(
    source: &Path,
    labels: impl IntoIterator<Item = &'a str>,
) -> Result<(), DerivationError> {
    split_file_name(source)?;
    for label in labels {
        derive(source, label)?;
    }
    Ok(())
}

/// Whether `base` already has the shape of a derived name, `<stem>_<label>`.
/// An upload named like that would be mistaken for another source's artifact.
pub fn is_derived_base<'a>(base: &str, labels: impl IntoIterator<Item = &'a str>) -> bool {
    labels.into_iter().any(|label| {
        base.strip_suffix(label)
            .and_then(|stem| stem.strip_suffix('_'))
            .is_some_and(|stem| !stem.is_empty())
    })
}

/// Whether a file whose base name is `file_base` is, or would be, an artifact
/// of a source with base name `base`: the source itself or one of its
/// derived resolutions.
pub fn shares_base<'a>(
    file_base: &str,
    base: &str,
    labels: impl IntoIterator<Item = &'a str>,
) -> bool {
    if file_base == base {
        return true;
    }
    file_base
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|label| labels.into_iter().any(|l| l == label))
}
