//! Configuration for feature extraction and batch runs.
//!
//! Every parameter is checked by [`ExtractionConfig::validate`] before a single image is touched, so a bad value
//! fails the whole run up front instead of failing every image one by one.
//!
//! With the `serde` feature enabled a [`BatchConfig`] can be stored as and loaded from JSON:
//!
//! ```no_run
//! # #[cfg(feature = "serde")]
//! # fn main() -> chroma_signature::Result<()> {
//! use chroma_signature::BatchConfig;
//! use std::path::Path;
//!
//! let config = BatchConfig::from_json_file(Path::new("batch.json"))?;
//! config.extraction.validate()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serde"))]
//! # fn main() {}
//! ```

use crate::{
    error::{Result, SignatureError},
    palette_reducer::validate_bins,
};
use std::{fmt, path::PathBuf, str::FromStr};

/// How dominant colors are rendered in a feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ColorMode {
    Rgb,
    #[default]
    Hex,
}

impl FromStr for ColorMode {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorMode::Rgb),
            "hex" => Ok(ColorMode::Hex),
            _ => Err(SignatureError::invalid_configuration("color_mode", s)),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Rgb => f.write_str("RGB"),
            ColorMode::Hex => f.write_str("HEX"),
        }
    }
}

/// Parameters for turning one image into a feature row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractionConfig {
    /// Height of the ratio-preserving resize, in pixels.
    pub resize_height: u32,
    /// Side length of the square image the colors are extracted from.
    pub square_size: u32,
    /// Quantization levels per channel.
    pub bins: u32,
    /// Number of dominant colors to extract.
    pub num_of_colors: usize,
    pub color_mode: ColorMode,
    /// Seed for the clustering initialization.
    pub seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Independently seeded clustering runs, the best of which is kept.
    pub runs: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resize_height: crate::DEFAULT_RESIZE_HEIGHT,
            square_size: crate::DEFAULT_SQUARE_SIZE,
            bins: crate::DEFAULT_BINS,
            num_of_colors: crate::DEFAULT_NUM_OF_COLORS,
            color_mode: ColorMode::default(),
            seed: crate::DEFAULT_SEED,
            max_iterations: crate::DEFAULT_MAX_ITERATIONS,
            tolerance: crate::DEFAULT_TOLERANCE,
            runs: crate::DEFAULT_RUNS,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_bins(self.bins)?;

        if self.num_of_colors < 1 {
            return Err(SignatureError::invalid_configuration("num_of_colors", self.num_of_colors));
        }

        if self.resize_height == 0 {
            return Err(SignatureError::invalid_configuration("resize_height", self.resize_height));
        }

        if self.square_size == 0 {
            return Err(SignatureError::invalid_configuration("square_size", self.square_size));
        }

        if self.max_iterations == 0 {
            return Err(SignatureError::invalid_configuration("max_iterations", self.max_iterations));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SignatureError::invalid_configuration("tolerance", self.tolerance));
        }

        Ok(())
    }
}

/// Parameters for processing a whole collection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchConfig {
    pub extraction: ExtractionConfig,
    /// Label written into every row and used to name the output folder and files.
    pub label: String,
    /// Whether to save the normalized images and the feature table.
    pub save: bool,
    /// Folder the `label` output folder is created in. The working directory when unset.
    pub save_path: Option<PathBuf>,
    /// Process images on a worker pool instead of one by one.
    pub parallel: bool,
    /// Worker count for parallel runs. Rayon's default when unset.
    pub threads: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            label: crate::DEFAULT_LABEL.to_string(),
            save: false,
            save_path: None,
            parallel: false,
            threads: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;

        if self.label.is_empty() || self.label.contains(['/', '\\']) {
            return Err(SignatureError::invalid_configuration("label", &self.label));
        }

        if self.threads == Some(0) {
            return Err(SignatureError::invalid_configuration("threads", 0));
        }

        Ok(())
    }

    /// The folder outputs are written to: `save_path/label`.
    pub fn output_dir(&self) -> PathBuf {
        self.save_path.clone().unwrap_or_else(|| PathBuf::from(".")).join(&self.label)
    }
}

#[cfg(feature = "serde")]
impl BatchConfig {
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SignatureError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SignatureError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BatchConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.bins, 5);
        assert_eq!(config.extraction.num_of_colors, 5);
        assert_eq!(config.extraction.color_mode, ColorMode::Hex);
        assert_eq!(config.label, "new_label");
    }

    #[test]
    fn color_mode_parses_case_insensitively() {
        assert_eq!("RGB".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!("hex".parse::<ColorMode>().unwrap(), ColorMode::Hex);
        assert!(matches!(
            "hsv".parse::<ColorMode>(),
            Err(SignatureError::InvalidConfiguration {
                parameter: "color_mode",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            ExtractionConfig {
                bins: 1,
                ..Default::default()
            },
            ExtractionConfig {
                num_of_colors: 0,
                ..Default::default()
            },
            ExtractionConfig {
                square_size: 0,
                ..Default::default()
            },
            ExtractionConfig {
                tolerance: f64::NAN,
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(SignatureError::InvalidConfiguration { .. })),
                "{config:?}"
            );
        }
    }

    #[test]
    fn rejects_labels_that_escape_the_output_folder() {
        let config = BatchConfig {
            label: "../elsewhere".to_string(),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn output_dir_joins_label() {
        let config = BatchConfig {
            label: "monet".to_string(),
            save_path: Some(PathBuf::from("/data/out")),
            ..Default::default()
        };

        assert_eq!(config.output_dir(), PathBuf::from("/data/out/monet"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let config = BatchConfig {
            label: "impressionism".to_string(),
            parallel: true,
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: BatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let partial: BatchConfig = serde_json::from_str(r#"{"label": "baroque", "extraction": {"bins": 8}}"#).unwrap();
        assert_eq!(partial.extraction.bins, 8);
        assert_eq!(partial.extraction.num_of_colors, 5);
    }
}
