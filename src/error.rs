//! Error types for content ingestion and image loading.

use core::fmt;
use std::io;

/// Book content decoding/loading error.
#[derive(Debug)]
pub enum ContentError {
    /// Reading the content file failed.
    Io(io::Error),
    /// Input is not valid JSON.
    Json(serde_json::Error),
    /// Top-level JSON is neither a page array nor a CMS envelope.
    UnrecognizedEnvelope,
    /// A CMS record matched none of the known shapes.
    UnrecognizedRecord { index: usize },
    /// A `num` field could not be read as a non-negative page number.
    InvalidPageNumber { index: usize, value: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "content read failed: {}", err),
            Self::Json(err) => write!(f, "content is not valid JSON: {}", err),
            Self::UnrecognizedEnvelope => write!(
                f,
                "content must be an array of strings or an object with `contents`/`items`"
            ),
            Self::UnrecognizedRecord { index } => {
                write!(f, "content record {} has no recognized fields", index)
            }
            Self::InvalidPageNumber { index, value } => write!(
                f,
                "content record {} has invalid page number `{}`",
                index, value
            ),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ContentError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Failure to fetch or decode one referenced image.
#[derive(Debug)]
pub enum ImageError {
    /// Local read failed.
    Io(io::Error),
    /// Remote fetch failed before a response was received.
    Fetch(String),
    /// Remote fetch returned a non-success status.
    Status(u16),
    /// URL cannot be resolved by the configured source.
    UnsupportedUrl(String),
    /// Bytes were fetched but could not be decoded.
    Decode(String),
    /// Decoded image has a zero dimension.
    EmptyImage,
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "image read failed: {}", err),
            Self::Fetch(msg) => write!(f, "image fetch failed: {}", msg),
            Self::Status(code) => write!(f, "image fetch returned status {}", code),
            Self::UnsupportedUrl(url) => write!(f, "unsupported image url: {}", url),
            Self::Decode(msg) => write!(f, "image decode failed: {}", msg),
            Self::EmptyImage => write!(f, "image has zero width or height"),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ImageError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<image::ImageError> for ImageError {
    fn from(value: image::ImageError) -> Self {
        Self::Decode(value.to_string())
    }
}
