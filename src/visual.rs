//! Image helpers for looking at episodes: block upscaling, min-max
//! normalization and side-by-side stacking of frames.
//!
//! Images are `(height, width, 3)` arrays of 8-bit RGB.

use ndarray::{s, Array3, ArrayView3, Axis};
use image::RgbImage;

use crate::error::VisualError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackOptions {
    pub border_thickness: usize,
    pub border_color: [u8; 3],
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            border_thickness: 1,
            border_color: [255, 255, 255],
        }
    }
}

/// Nearest-neighbour upscaling: every pixel becomes a `factor x factor` block.
pub fn upscale(image: &Array3<u8>, factor: usize) -> Result<Array3<u8>, VisualError> {
    if factor == 0 {
        return Err(VisualError::InvalidFactor);
    }
    let (h, w, c) = image.dim();
    Ok(Array3::from_shape_fn((h * factor, w * factor, c), |(row, col, ch)| {
        image[[row / factor, col / factor, ch]]
    }))
}

/// Maps a float image linearly onto `0..=255`. A flat image maps to zeros.
pub fn normalize(image: &Array3<f32>) -> Array3<u8> {
    let min = image.iter().cloned().fold(std::f32::INFINITY, f32::min);
    let max = image.iter().cloned().fold(std::f32::NEG_INFINITY, f32::max);
    let range = max - min;
    image.mapv(|v| {
        if range > 0.0 {
            ((v - min) / range * 255.0).round() as u8
        } else {
            0
        }
    })
}

fn pad(image: ArrayView3<u8>, thickness: usize, color: [u8; 3]) -> Array3<u8> {
    let (h, w, _) = image.dim();
    let mut padded = Array3::from_shape_fn((h + 2 * thickness, w + 2 * thickness, 3), |(_, _, ch)| {
        color[ch]
    });
    padded
        .slice_mut(s![thickness..thickness + h, thickness..thickness + w, ..])
        .assign(&image);
    padded
}

/// Surrounds each image with a border and lays them out left to right.
pub fn stack_images(images: &[Array3<u8>], options: StackOptions) -> Result<Array3<u8>, VisualError> {
    let first = images.first().ok_or(VisualError::Empty)?;
    let height = first.dim().0;
    for (index, img) in images.iter().enumerate() {
        let dim = img.dim();
        if dim.0 != height || dim.2 != 3 {
            return Err(VisualError::ShapeMismatch { index, found: dim, height });
        }
    }

    let padded: Vec<Array3<u8>> = images
        .iter()
        .map(|img| pad(img.view(), options.border_thickness, options.border_color))
        .collect();
    let views: Vec<ArrayView3<u8>> = padded.iter().map(|img| img.view()).collect();
    ndarray::stack(Axis(1), &views).map_err(|_| VisualError::ShapeMismatch {
        index: 0,
        found: first.dim(),
        height,
    })
}

pub fn to_rgb_image(image: &Array3<u8>) -> Result<RgbImage, VisualError> {
    let (height, width, _) = image.dim();
    let raw: Vec<u8> = image.iter().cloned().collect();
    RgbImage::from_raw(width as u32, height as u32, raw)
        .ok_or(VisualError::BufferSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(h: usize, w: usize, color: [u8; 3]) -> Array3<u8> {
        Array3::from_shape_fn((h, w, 3), |(_, _, ch)| color[ch])
    }

    #[test]
    fn upscale_repeats_blocks() {
        let mut img = Array3::<u8>::zeros((2, 2, 3));
        img[[0, 1, 0]] = 255;
        let big = upscale(&img, 3).unwrap();
        assert_eq!(big.dim(), (6, 6, 3));
        assert_eq!(big[[2, 5, 0]], 255);
        assert_eq!(big[[3, 5, 0]], 0);
        assert_eq!(big[[0, 2, 0]], 0);
        assert_eq!(upscale(&img, 0).err(), Some(VisualError::InvalidFactor));
    }

    #[test]
    fn stacks_with_white_border() {
        let red = solid(2, 3, [255, 0, 0]);
        let green = solid(2, 1, [0, 255, 0]);
        let out = stack_images(&[red, green], StackOptions::default()).unwrap();
        // (2 + 2) rows, (3 + 2) + (1 + 2) columns
        assert_eq!(out.dim(), (4, 8, 3));
        assert_eq!(out.slice(s![0, 0, ..]).to_vec(), vec![255, 255, 255]);
        assert_eq!(out.slice(s![1, 1, ..]).to_vec(), vec![255, 0, 0]);
        assert_eq!(out.slice(s![1, 4, ..]).to_vec(), vec![255, 255, 255]);
        assert_eq!(out.slice(s![1, 6, ..]).to_vec(), vec![0, 255, 0]);
    }

    #[test]
    fn custom_border() {
        let options = StackOptions { border_thickness: 2, border_color: [9, 9, 9] };
        let out = stack_images(&[solid(1, 1, [0, 0, 0])], options).unwrap();
        assert_eq!(out.dim(), (5, 5, 3));
        assert_eq!(out[[0, 4, 1]], 9);
        assert_eq!(out[[2, 2, 1]], 0);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(stack_images(&[], StackOptions::default()).err(), Some(VisualError::Empty));
        let err = stack_images(&[solid(2, 2, [0; 3]), solid(3, 2, [0; 3])], StackOptions::default());
        assert_eq!(
            err.err(),
            Some(VisualError::ShapeMismatch { index: 1, found: (3, 2, 3), height: 2 })
        );
    }

    #[test]
    fn normalize_spans_full_range() {
        let img = Array3::from_shape_fn((1, 3, 3), |(_, col, _)| col as f32 * 0.5);
        let out = normalize(&img);
        assert_eq!(out[[0, 0, 0]], 0);
        assert_eq!(out[[0, 1, 0]], 128);
        assert_eq!(out[[0, 2, 2]], 255);
        assert!(normalize(&Array3::<f32>::ones((2, 2, 3))).iter().all(|v| *v == 0));
    }

    #[test]
    fn converts_to_rgb_image() {
        let mut img = Array3::<u8>::zeros((2, 3, 3));
        img[[1, 2, 1]] = 200;
        let rgb = to_rgb_image(&img).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(rgb.get_pixel(2, 1).0, [0, 200, 0]);
    }
}
