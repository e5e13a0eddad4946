// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A library to extract comparable color signatures from images.
//!
//! A signature consists of the image's dominant colors, ranked by how many pixels they cover, and two tone
//! metrics: the chiaroscuro ratio (near-white over near-black pixels) and the whitespace ratio (percentage of
//! near-white pixels). Before the colors are clustered every channel is reduced to a small number of evenly spread
//! levels, which keeps the output coarse enough to compare across images.
//!
//! ```no_run
//! use chroma_signature::{ColorMode, Signature};
//!
//! let image = chroma_signature::image::open("painting.jpg").unwrap().to_rgb8();
//! let signature = Signature::from_image(image).bins(5).colors(5).seed(7).generate().unwrap();
//!
//! println!("{:?}", signature.tone());
//! println!("{:?}", signature.colors(ColorMode::Hex));
//! ```
//!
//! Whole folders of images are processed into feature rows with [`process_collection`].

mod batch;
mod chart;
mod cluster_quantizer;
mod config;
mod error;
mod features;
mod hex;
mod kmeans;
mod normalize;
mod palette_reducer;
mod swatch;
mod tone;

pub const DEFAULT_RESIZE_HEIGHT: u32 = 150;
pub const DEFAULT_SQUARE_SIZE: u32 = 150;
pub const DEFAULT_BINS: u32 = 5;
pub const DEFAULT_NUM_OF_COLORS: usize = 5;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_RUNS: usize = 10;
pub const DEFAULT_LABEL: &str = "new_label";
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub use crate::{
    batch::{collect_images, process_collection, write_csv, BatchReport},
    chart::ColorChart,
    cluster_quantizer::{extract_colors, ClusterQuantizer},
    config::{BatchConfig, ColorMode, ExtractionConfig},
    error::{Result, SignatureError},
    features::{FeatureRow, FeatureRowBuilder},
    hex::{hex_to_rgb, rgb_from_channels, rgb_to_hex, try_rgb_to_hex},
    normalize::{aspect_ratio, decode, resize_keep_ratio, square},
    palette_reducer::{map_channel, reduce_palette, ChannelMap},
    swatch::{ColorValue, Swatch},
    tone::{tone_metrics, ToneCounts, ToneMetrics},
};
pub use image;

use image::{DynamicImage, RgbImage};

/// The color signature of a single image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    tone: ToneMetrics,
    swatches: Vec<Swatch>,
}

pub struct SignatureBuilder {
    image: RgbImage,
    bins: u32,
    num_of_colors: usize,
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
    runs: usize,
}

impl Signature {
    pub fn from_image(image: RgbImage) -> SignatureBuilder {
        SignatureBuilder::from_image(image)
    }

    pub fn tone(&self) -> ToneMetrics {
        self.tone
    }

    /// The dominant colors, most common first.
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn colors(&self, mode: ColorMode) -> Vec<ColorValue> {
        self.swatches.iter().map(|swatch| swatch.render(mode)).collect()
    }

    pub fn most_prominent_color(&self) -> Option<(u8, u8, u8)> {
        self.swatches.first().map(|swatch| swatch.rgb())
    }

    pub fn chart(&self, title: impl Into<String>) -> ColorChart {
        ColorChart::from_swatches(title, &self.swatches)
    }
}

impl SignatureBuilder {
    pub fn from_image(image: RgbImage) -> Self {
        Self {
            image,
            bins: DEFAULT_BINS,
            num_of_colors: DEFAULT_NUM_OF_COLORS,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            runs: DEFAULT_RUNS,
        }
    }

    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        Self::from_image(image.to_rgb8())
    }

    pub fn bins(self, bins: u32) -> Self {
        Self { bins, ..self }
    }

    pub fn colors(self, num_of_colors: usize) -> Self {
        Self { num_of_colors, ..self }
    }

    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn runs(self, runs: usize) -> Self {
        Self { runs, ..self }
    }

    pub fn convergence(self, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..self
        }
    }

    /// Take the clustering and reduction parameters from an extraction config.
    pub fn config(self, config: &ExtractionConfig) -> Self {
        Self {
            bins: config.bins,
            num_of_colors: config.num_of_colors,
            seed: config.seed,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            runs: config.runs,
            ..self
        }
    }

    /// Reduce the palette, measure the tones of the reduced image and cluster its colors.
    pub fn generate(self) -> Result<Signature> {
        self.generate_with_reduced().map(|(signature, _)| signature)
    }

    /// Like [`SignatureBuilder::generate`], also handing back the palette-reduced image.
    pub fn generate_with_reduced(self) -> Result<(Signature, RgbImage)> {
        let channel_map = ChannelMap::new(self.bins)?;
        if self.num_of_colors < 1 {
            return Err(SignatureError::invalid_configuration("num_of_colors", self.num_of_colors));
        }

        let mut image = self.image;
        if image.width() == 0 || image.height() == 0 {
            return Err(SignatureError::EmptyImage);
        }

        channel_map.apply(&mut image);
        let tone = tone_metrics(&image)?;

        let pixels = image.pixels().copied().collect();
        let swatches = ClusterQuantizer::new(pixels, self.num_of_colors, channel_map)
            .convergence(self.max_iterations, self.tolerance)
            .runs(self.runs)
            .seed(self.seed)
            .get_quantized_colors()?;

        Ok((Signature { tone, swatches }, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    // left third black, middle third white, right third two shades of orange
    fn test_image() -> RgbImage {
        RgbImage::from_fn(30, 10, |x, y| match x {
            0..=9 => Rgb([0, 0, 0]),
            10..=19 => Rgb([255, 255, 255]),
            _ if y % 2 == 0 => Rgb([240, 120, 10]),
            _ => Rgb([250, 130, 0]),
        })
    }

    #[test]
    fn generates_tone_and_ranked_colors() {
        let signature = Signature::from_image(test_image()).colors(3).generate().unwrap();

        assert_eq!(signature.tone().chiaroscuro, 1.0);
        assert_eq!(signature.tone().whitespace_ratio, 33.33333);

        let populations: Vec<u32> = signature.swatches().iter().map(|s| s.population()).collect();
        assert_eq!(populations, vec![100, 100, 100]);
        assert!(signature.colors(ColorMode::Hex).contains(&ColorValue::Hex("#FF8000".to_string())));
    }

    #[test]
    fn same_seed_same_signature() {
        let a = Signature::from_image(test_image()).colors(2).seed(3).generate().unwrap();
        let b = Signature::from_image(test_image()).colors(2).seed(3).generate().unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn rejects_single_bin_before_processing() {
        let result = Signature::from_image(RgbImage::new(0, 0)).bins(1).generate();
        assert!(matches!(result, Err(SignatureError::InvalidConfiguration { parameter: "bins", .. })));
    }

    #[test]
    fn image_without_black_has_undefined_tone() {
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let result = Signature::from_image(image).generate();

        assert!(matches!(result, Err(SignatureError::UndefinedToneRatio { white: 16 })));
    }
}
