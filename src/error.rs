//! Error types for the annotator.

use crate::model::PageKey;
use thiserror::Error;

/// Refusals from the document store. State is unchanged whenever one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("page not found: {0}")]
    PageNotFound(PageKey),

    #[error("cannot delete the only remaining page")]
    LastPage,
}

/// Errors raised while rasterizing or writing the paint mask.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The stage has no area to render into
    #[error("cannot export a {width}x{height} mask")]
    EmptySurface { width: u32, height: u32 },

    #[error("no page is selected")]
    NoPage,
}

/// Errors raised while reading or writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while importing detection data onto a page.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no page is selected")]
    NoPage,
}
