//! Error types for the signature extraction pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SignatureError>;

#[derive(Error, Debug)]
pub enum SignatureError {
    /// A parameter can never produce a valid result. Raised before any image is processed.
    #[error("Invalid configuration: {parameter} = {value}")]
    InvalidConfiguration { parameter: &'static str, value: String },

    /// The image file could not be read or decoded.
    #[error("Failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image contains no pixels")]
    EmptyImage,

    /// The chiaroscuro ratio is undefined because the image has no near-black pixels.
    #[error("Chiaroscuro ratio is undefined: {white} white pixels but no black pixels")]
    UndefinedToneRatio { white: u64 },

    #[error("Channel {channel} value {value} is outside 0..=255")]
    InvalidChannelValue { channel: &'static str, value: i64 },

    #[error("Invalid HEX color string: {value:?}")]
    InvalidHex { value: String },

    /// The batch output directory already exists and would be overwritten.
    #[error("Output folder {} already exists; remove it or use a different label", path.display())]
    OutputCollision { path: PathBuf },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save image {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[cfg(feature = "serde")]
    #[error("Failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),
}

impl SignatureError {
    pub(crate) fn invalid_configuration(parameter: &'static str, value: impl ToString) -> Self {
        Self::InvalidConfiguration {
            parameter,
            value: value.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only concerns a single image, in which case a batch records it and keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SignatureError::Decode { .. }
                | SignatureError::EmptyImage
                | SignatureError::UndefinedToneRatio { .. }
                | SignatureError::Save { .. }
        )
    }
}
