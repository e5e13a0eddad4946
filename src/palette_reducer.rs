use crate::error::{Result, SignatureError};
use image::RgbImage;

const CHANNEL_MAX: u8 = u8::MAX;

/// Map a single channel value onto one of `bins` evenly spread levels.
///
/// The exact top value 255 is always kept as is. Every other value is first binned with
/// `floor(v * bins / 255)` and the bin index is then scaled back onto `0..=255`. `bins` must be at least 2.
pub fn map_channel(value: u8, bins: u32) -> Result<u8> {
    validate_bins(bins)?;
    Ok(map_channel_unchecked(value, bins))
}

fn map_channel_unchecked(value: u8, bins: u32) -> u8 {
    if value >= CHANNEL_MAX {
        return CHANNEL_MAX;
    }

    let level = value as u64 * bins as u64 / CHANNEL_MAX as u64;
    let scaled = (level as f64 * CHANNEL_MAX as f64 / (bins - 1) as f64).round_ties_even().abs();

    // level < bins, so scaled never exceeds 255
    scaled.min(CHANNEL_MAX as f64) as u8
}

pub(crate) fn validate_bins(bins: u32) -> Result<()> {
    if bins < 2 {
        Err(SignatureError::invalid_configuration("bins", bins))
    } else {
        Ok(())
    }
}

/// Precomputed [`map_channel`] results for every possible channel value at a fixed bin count.
#[derive(Debug, Clone)]
pub struct ChannelMap {
    table: [u8; 256],
}

impl ChannelMap {
    pub fn new(bins: u32) -> Result<Self> {
        validate_bins(bins)?;

        let mut table = [0; 256];
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = map_channel_unchecked(value as u8, bins);
        }

        Ok(Self { table })
    }

    pub fn map(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    pub fn map_rgb(&self, (r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
        (self.map(r), self.map(g), self.map(b))
    }

    /// Apply the map to every subpixel of the image in place.
    pub fn apply(&self, image: &mut RgbImage) {
        for subpixel in image.iter_mut() {
            *subpixel = self.map(*subpixel);
        }
    }
}

/// Return a copy of the image with every channel value reduced to `bins` levels.
pub fn reduce_palette(image: &RgbImage, bins: u32) -> Result<RgbImage> {
    let map = ChannelMap::new(bins)?;
    let mut reduced = image.clone();
    map.apply(&mut reduced);

    Ok(reduced)
}
