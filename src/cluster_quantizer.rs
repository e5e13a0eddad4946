use crate::{
    config::ColorMode,
    error::{Result, SignatureError},
    kmeans::Kmeans,
    palette_reducer::ChannelMap,
    swatch::{ColorValue, Swatch},
};
use image::RgbImage;
use std::collections::HashMap;

/// Extract the `num_of_colors` dominant colors of an image, most common first, rendered per `color_mode`.
///
/// The clustering is seeded with `seed`; the same image and seed always give the same colors. Without a pinned
/// seed only the number of colors and their relative order are stable across runs.
pub fn extract_colors(
    image: &RgbImage,
    num_of_colors: usize,
    bins: u32,
    color_mode: ColorMode,
    seed: u64,
) -> Result<Vec<ColorValue>> {
    let pixels = image.pixels().copied().collect();
    let swatches = ClusterQuantizer::new(pixels, num_of_colors, ChannelMap::new(bins)?)
        .seed(seed)
        .get_quantized_colors()?;

    Ok(swatches.into_iter().map(|swatch| swatch.render(color_mode)).collect())
}

pub struct ClusterQuantizer<P>
where
    P: image::Pixel<Subpixel = u8>,
{
    pixels: Vec<P>,
    max_colors: usize,
    channel_map: ChannelMap,
    max_iterations: usize,
    tolerance: f64,
    runs: usize,
    seed: u64,
}

impl<P> ClusterQuantizer<P>
where
    P: image::Pixel<Subpixel = u8>,
{
    pub fn new(pixels: Vec<P>, max_colors: usize, channel_map: ChannelMap) -> Self {
        Self {
            pixels,
            max_colors,
            channel_map,
            max_iterations: crate::DEFAULT_MAX_ITERATIONS,
            tolerance: crate::DEFAULT_TOLERANCE,
            runs: crate::DEFAULT_RUNS,
            seed: crate::DEFAULT_SEED,
        }
    }

    pub fn convergence(self, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..self
        }
    }

    pub fn runs(self, runs: usize) -> Self {
        Self { runs, ..self }
    }

    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Cluster the pixels and return the cluster centroids as swatches, most populous first.
    ///
    /// Clusters of equal population keep their clustering order. Every centroid is reduced through the channel
    /// map before it's returned.
    pub fn get_quantized_colors(self) -> Result<Vec<Swatch>> {
        if self.max_colors < 1 {
            return Err(SignatureError::invalid_configuration("num_of_colors", self.max_colors));
        }

        if self.pixels.is_empty() {
            return Err(SignatureError::EmptyImage);
        }

        // begin by generating a histogram of the exact pixel values
        let mut hist = HashMap::new();
        for pixel in self.pixels.iter() {
            *hist.entry(pixel_to_rgb(pixel)).or_insert(0u32) += 1;
        }

        // the histogram iteration order is random, so order the colors by combining their channels into a single
        // integer where the red channel is the most significant and the blue the least
        let mut colors = hist.into_iter().collect::<Vec<_>>();
        colors.sort_by_key(|&((r, g, b), _)| ((r as u32) << 16) | ((g as u32) << 8) | b as u32);

        let mut swatches: Vec<Swatch> = if colors.len() <= self.max_colors {
            // there are no more colors than requested; every color is its own cluster
            log::debug!(
                "{} distinct colors for {} requested, skipping clustering",
                colors.len(),
                self.max_colors
            );

            colors
                .into_iter()
                .map(|(rgb, count)| Swatch::new(self.channel_map.map_rgb(rgb), count))
                .collect()
        } else {
            let kmeans = Kmeans {
                clusters: self.max_colors,
                max_iterations: self.max_iterations,
                tolerance: self.tolerance,
                runs: self.runs,
                seed: self.seed,
            };

            kmeans
                .run(&colors)
                .into_iter()
                .filter(|cluster| cluster.population > 0)
                .map(|cluster| {
                    let rgb = centroid_to_rgb(cluster.centroid);
                    Swatch::new(self.channel_map.map_rgb(rgb), cluster.population)
                })
                .collect()
        };

        // stable, so equal populations keep their cluster order
        swatches.sort_by(|a, b| b.population().cmp(&a.population()));
        Ok(swatches)
    }
}

fn pixel_to_rgb<P>(pixel: &P) -> (u8, u8, u8)
where
    P: image::Pixel<Subpixel = u8>,
{
    let rgb = pixel.to_rgb();
    (rgb.0[0], rgb.0[1], rgb.0[2])
}

fn centroid_to_rgb(centroid: [f64; 3]) -> (u8, u8, u8) {
    let channel = |value: f64| value.round().clamp(0.0, 255.0) as u8;
    (channel(centroid[0]), channel(centroid[1]), channel(centroid[2]))
}
