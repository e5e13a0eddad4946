use crate::{
    config::ExtractionConfig,
    error::Result,
    normalize::{aspect_ratio, decode, resize_keep_ratio, square},
    swatch::ColorValue,
    Signature,
};
use image::RgbImage;
use std::path::Path;

/// The extracted features of one image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureRow {
    pub label: String,
    pub id: String,
    /// Height over width of the image before it was squared.
    pub aspect_ratio: f64,
    pub chiaroscuro: f64,
    pub whitespace_ratio: f64,
    /// Dominant colors, most common first.
    pub colors: Vec<ColorValue>,
}

impl FeatureRow {
    /// The row as table fields: label, id, aspect_ratio, chiaroscuro, whitespace_ratio, color_1..color_n.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.label.clone(),
            self.id.clone(),
            format!("{:?}", self.aspect_ratio),
            format!("{:?}", self.chiaroscuro),
            format!("{:?}", self.whitespace_ratio),
        ];

        record.extend(self.colors.iter().map(ToString::to_string));
        record
    }
}

/// Turns decoded images into feature rows for one labelled collection.
///
/// The builder holds no counter of its own; callers pass each image's position in the collection, which becomes
/// part of its identifier.
#[derive(Debug, Clone)]
pub struct FeatureRowBuilder {
    label: String,
    config: ExtractionConfig,
}

impl FeatureRowBuilder {
    pub fn new(label: impl Into<String>, config: ExtractionConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `label_NNNN`, the index zero-padded to four digits.
    pub fn identifier(&self, index: usize) -> String {
        format!("{}_{:04}", self.label, index)
    }

    /// Extract the features of an image. Also returns the normalized, palette-reduced image the colors were taken
    /// from.
    pub fn build(&self, index: usize, image: &RgbImage) -> Result<(FeatureRow, RgbImage)> {
        let id = self.identifier(index);

        let resized = resize_keep_ratio(image, self.config.resize_height)?;
        let aspect_ratio = aspect_ratio(&resized);
        let squared = square(&resized, self.config.square_size)?;

        let (signature, reduced) = Signature::from_image(squared)
            .config(&self.config)
            .generate_with_reduced()?;

        let tone = signature.tone();
        log::debug!(
            "{}: aspect ratio {}, chiaroscuro {}, whitespace {}",
            id,
            aspect_ratio,
            tone.chiaroscuro,
            tone.whitespace_ratio
        );

        let row = FeatureRow {
            label: self.label.clone(),
            id,
            aspect_ratio,
            chiaroscuro: tone.chiaroscuro,
            whitespace_ratio: tone.whitespace_ratio,
            colors: signature.colors(self.config.color_mode),
        };

        Ok((row, reduced))
    }

    pub fn build_from_path(&self, index: usize, path: &Path) -> Result<(FeatureRow, RgbImage)> {
        let image = decode(path)?;
        self.build(index, &image)
    }
}
