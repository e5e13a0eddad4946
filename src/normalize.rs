use crate::error::{Result, SignatureError};
use image::{imageops::FilterType, RgbImage};
use std::path::Path;

// closest of the available filters to area interpolation when downscaling
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Decode an image file into 8-bit RGB.
pub fn decode(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|source| SignatureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(image.to_rgb8())
}

/// Resize to the given height, keeping the aspect ratio. The width is truncated and never drops below one pixel.
pub fn resize_keep_ratio(image: &RgbImage, height: u32) -> Result<RgbImage> {
    if height == 0 {
        return Err(SignatureError::invalid_configuration("resize_height", height));
    }

    let (width, original_height) = image.dimensions();
    if width == 0 || original_height == 0 {
        return Err(SignatureError::EmptyImage);
    }

    let ratio = original_height as f64 / width as f64;
    let new_width = ((height as f64 / ratio) as u32).max(1);

    Ok(image::imageops::resize(image, new_width, height, RESIZE_FILTER))
}

/// Resize to a `size` by `size` square, stretching as needed.
pub fn square(image: &RgbImage, size: u32) -> Result<RgbImage> {
    if size == 0 {
        return Err(SignatureError::invalid_configuration("square_size", size));
    }

    if image.width() == 0 || image.height() == 0 {
        return Err(SignatureError::EmptyImage);
    }

    Ok(image::imageops::resize(image, size, size, RESIZE_FILTER))
}

/// Height over width, rounded to five decimals.
pub fn aspect_ratio(image: &RgbImage) -> f64 {
    crate::tone::round_to(image.height() as f64 / image.width() as f64, 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn keeps_ratio_when_resizing() {
        let image = RgbImage::from_pixel(300, 600, Rgb([10, 20, 30]));
        let resized = resize_keep_ratio(&image, 150).unwrap();

        assert_eq!(resized.dimensions(), (75, 150));
        assert_eq!(aspect_ratio(&resized), 2.0);
        assert_eq!(resized.get_pixel(10, 10), &Rgb([10, 20, 30]));
    }

    #[test]
    fn very_wide_images_keep_a_column() {
        let image = RgbImage::from_pixel(1, 1000, Rgb([0, 0, 0]));
        assert_eq!(resize_keep_ratio(&image, 10).unwrap().dimensions(), (1, 10));
    }

    #[test]
    fn squares_any_shape() {
        let image = RgbImage::from_pixel(40, 7, Rgb([200, 100, 0]));
        let squared = square(&image, 16).unwrap();

        assert_eq!(squared.dimensions(), (16, 16));
        assert!(squared.pixels().all(|p| *p == Rgb([200, 100, 0])));
    }

    #[test]
    fn zero_sizes_and_empty_images_are_rejected() {
        let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));

        assert!(matches!(square(&image, 0), Err(SignatureError::InvalidConfiguration { .. })));
        assert!(matches!(resize_keep_ratio(&image, 0), Err(SignatureError::InvalidConfiguration { .. })));
        assert!(matches!(square(&RgbImage::new(0, 0), 8), Err(SignatureError::EmptyImage)));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let result = decode(Path::new("definitely/not/here.png"));
        assert!(matches!(result, Err(SignatureError::Decode { .. })));
    }
}
