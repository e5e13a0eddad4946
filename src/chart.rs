use crate::{
    error::{Result, SignatureError},
    hex::hex_to_rgb,
    swatch::Swatch,
};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// A strip of color bands for eyeballing an extracted palette.
///
/// Bands are laid out left to right in the given order. Their widths follow the swatch populations when the chart
/// is built from swatches, otherwise every band is equally wide.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorChart {
    title: String,
    bands: Vec<((u8, u8, u8), u32)>,
}

impl ColorChart {
    /// Build a chart from `#RRGGBB` strings.
    pub fn new<S: AsRef<str>>(title: impl Into<String>, colors: &[S]) -> Result<Self> {
        let bands = colors
            .iter()
            .map(|hex| hex_to_rgb(hex.as_ref()).map(|rgb| (rgb, 1)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            title: title.into(),
            bands,
        })
    }

    pub fn from_swatches(title: impl Into<String>, swatches: &[Swatch]) -> Self {
        Self {
            title: title.into(),
            bands: swatches.iter().map(|s| (s.rgb(), s.population())).collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn to_image(&self, width: u32, height: u32) -> RgbImage {
        let total: u64 = self.bands.iter().map(|&(_, weight)| weight as u64).sum();
        let mut image = RgbImage::new(width, height);

        if total == 0 || width == 0 {
            return image;
        }

        // cumulative edges so rounding never leaves a gap at the right border
        let mut edges = Vec::with_capacity(self.bands.len());
        let mut cumulative = 0;
        for &(_, weight) in &self.bands {
            cumulative += weight as u64;
            edges.push((cumulative * width as u64 / total) as u32);
        }

        let mut band = 0;
        for x in 0..width {
            while x >= edges[band] {
                band += 1;
            }

            let (r, g, b) = self.bands[band].0;
            for y in 0..height {
                image.put_pixel(x, y, Rgb([r, g, b]));
            }
        }

        image
    }

    /// Write the chart as a PNG named after its title into `dir` and return the written path.
    pub fn save(&self, dir: &Path, width: u32, height: u32) -> Result<PathBuf> {
        let path = dir.join(format!("{}.png", file_stem(&self.title)));

        self.to_image(width, height)
            .save(&path)
            .map_err(|source| SignatureError::Save {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        "chart".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bands_from_hex() {
        let chart = ColorChart::new("primaries", &["#FF0000", "#00FF00", "#0000FF"]).unwrap();
        let image = chart.to_image(30, 2);

        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(9, 1), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(10, 0), &Rgb([0, 255, 0]));
        assert_eq!(image.get_pixel(29, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn band_widths_follow_population() {
        let swatches = [Swatch::new((255, 255, 255), 3), Swatch::new((0, 0, 0), 1)];
        let image = ColorChart::from_swatches("tones", &swatches).to_image(8, 1);

        let white = image.pixels().filter(|p| **p == Rgb([255, 255, 255])).count();
        assert_eq!(white, 6);
        assert_eq!(image.get_pixel(7, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(ColorChart::new("bad", &["#FF00"]).is_err());
    }

    #[test]
    fn titles_become_safe_file_names() {
        assert_eq!(file_stem("Monet / Water Lilies"), "Monet___Water_Lilies");
        assert_eq!(file_stem(""), "chart");
    }
}
