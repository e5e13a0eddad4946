use crate::error::{Result, SignatureError};
use image::RgbImage;
use rayon::prelude::*;

const BLACK_MAX_CHANNEL: u8 = 50;
const WHITE_MIN_CHANNEL: u8 = 206;
const RATIO_DECIMALS: i32 = 5;

/// The two scalar tone metrics of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneMetrics {
    /// Near-white pixel count divided by near-black pixel count.
    pub chiaroscuro: f64,
    /// Percentage of near-white pixels.
    pub whitespace_ratio: f64,
}

/// Pixel counts per tone bucket. Every pixel lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneCounts {
    pub black: u64,
    pub white: u64,
    pub color: u64,
}

impl ToneCounts {
    pub fn of(image: &RgbImage) -> Self {
        image
            .as_raw()
            .par_chunks_exact(3)
            .fold(ToneCounts::default, |mut counts, pixel| {
                if pixel.iter().all(|&c| c <= BLACK_MAX_CHANNEL) {
                    counts.black += 1;
                } else if pixel.iter().all(|&c| c >= WHITE_MIN_CHANNEL) {
                    counts.white += 1;
                } else {
                    counts.color += 1;
                }

                counts
            })
            .reduce(ToneCounts::default, |a, b| ToneCounts {
                black: a.black + b.black,
                white: a.white + b.white,
                color: a.color + b.color,
            })
    }

    pub fn total(&self) -> u64 {
        self.black + self.white + self.color
    }

    pub fn metrics(&self) -> Result<ToneMetrics> {
        let total = self.total();
        if total == 0 {
            return Err(SignatureError::EmptyImage);
        }

        if self.black == 0 {
            return Err(SignatureError::UndefinedToneRatio { white: self.white });
        }

        Ok(ToneMetrics {
            chiaroscuro: round_to(self.white as f64 / self.black as f64, RATIO_DECIMALS),
            whitespace_ratio: round_to((self.white * 100) as f64 / total as f64, RATIO_DECIMALS),
        })
    }
}

/// Compute the chiaroscuro and whitespace ratios of an image.
///
/// Fails with [`SignatureError::UndefinedToneRatio`] when the image has no near-black pixels, and with
/// [`SignatureError::EmptyImage`] when it has no pixels at all.
pub fn tone_metrics(image: &RgbImage) -> Result<ToneMetrics> {
    ToneCounts::of(image).metrics()
}

/// Round to `decimals` places, ties to even.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn image_from(pixels: &[(Rgb<u8>, u32)]) -> RgbImage {
        let colors: Vec<Rgb<u8>> = pixels
            .iter()
            .flat_map(|(color, count)| std::iter::repeat(*color).take(*count as usize))
            .collect();

        RgbImage::from_fn(colors.len() as u32, 1, |x, _| colors[x as usize])
    }

    #[test]
    fn black_and_white_only() {
        let image = image_from(&[(Rgb([0, 0, 0]), 10), (Rgb([255, 255, 255]), 5)]);
        let metrics = tone_metrics(&image).unwrap();

        assert_eq!(metrics.chiaroscuro, 0.5);
        assert_eq!(metrics.whitespace_ratio, 33.33333);
    }

    #[test]
    fn buckets_partition_every_pixel() {
        let image = image_from(&[
            (Rgb([50, 50, 50]), 3),
            (Rgb([51, 0, 0]), 4),
            (Rgb([206, 206, 206]), 2),
            (Rgb([206, 206, 205]), 6),
        ]);
        let counts = ToneCounts::of(&image);

        assert_eq!(
            counts,
            ToneCounts {
                black: 3,
                white: 2,
                color: 10
            }
        );
        assert_eq!(counts.total(), 15);
    }

    #[test]
    fn no_black_pixels_is_an_error() {
        let image = image_from(&[(Rgb([255, 255, 255]), 4), (Rgb([120, 30, 30]), 4)]);

        assert!(matches!(
            tone_metrics(&image),
            Err(SignatureError::UndefinedToneRatio { white: 4 })
        ));
    }

    #[test]
    fn empty_image_is_an_error() {
        assert!(matches!(tone_metrics(&RgbImage::new(0, 0)), Err(SignatureError::EmptyImage)));
    }

    #[test]
    fn ratios_are_rounded_to_five_decimals() {
        let image = image_from(&[(Rgb([0, 0, 0]), 3), (Rgb([255, 255, 255]), 2), (Rgb([90, 90, 90]), 1)]);
        let metrics = tone_metrics(&image).unwrap();

        assert_eq!(metrics.chiaroscuro, 0.66667);
        assert_eq!(metrics.whitespace_ratio, 33.33333);
    }

    #[test]
    fn exact_ties_round_to_even() {
        let counts = ToneCounts {
            black: 64,
            white: 1,
            color: 0,
        };
        let metrics = counts.metrics().unwrap();

        assert_eq!(metrics.chiaroscuro, 0.01562);
        assert_eq!(round_to(0.046875, 5), 0.04688);
    }
}
