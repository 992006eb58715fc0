//! Test utilities for imageops-cutout
//!
//! Fixtures shared by the unit tests. Only compiled when running tests.

#[cfg(test)]
use image::{Luma, Pixel, Primitive, Rgba};
#[cfg(test)]
use imageproc::definitions::Image;

/// Creates a 2x2 RGBA image with known pixel values:
/// - (0,0): [200, 150, 100, 255] (opaque)
/// - (1,0): [100, 200, 150, 128] (semi-transparent)
/// - (0,1): [150, 100, 200, 64]  (more transparent)
/// - (1,1): [50, 75, 25, 0]      (fully transparent)
#[cfg(test)]
pub fn create_test_rgba_image() -> Image<Rgba<u8>> {
    let mut image: Image<Rgba<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgba([200, 150, 100, 255]));
    image.put_pixel(1, 0, Rgba([100, 200, 150, 128]));
    image.put_pixel(0, 1, Rgba([150, 100, 200, 64]));
    image.put_pixel(1, 1, Rgba([50, 75, 25, 0]));
    image
}

/// Creates a 2x2 coverage mask:
/// - (0,0): [255] (fully opaque)
/// - (1,0): [192] (mostly opaque)
/// - (0,1): [128] (semi-transparent)
/// - (1,1): [64]  (mostly transparent)
#[cfg(test)]
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    let mut mask: Image<Luma<u8>> = Image::new(2, 2);
    mask.put_pixel(0, 0, Luma([255]));
    mask.put_pixel(1, 0, Luma([192]));
    mask.put_pixel(0, 1, Luma([128]));
    mask.put_pixel(1, 1, Luma([64]));
    mask
}

/// Binary mask with a filled disc of `radius` around (`cx`, `cy`)
#[cfg(test)]
pub fn create_disc_mask(width: u32, height: u32, cx: f32, cy: f32, radius: f32) -> Image<Luma<u8>> {
    Image::from_fn(width, height, |x, y| {
        let inside = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy) <= radius;
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Photo-like guide whose red channel is bright inside the disc and dark outside
#[cfg(test)]
pub fn create_disc_guide(width: u32, height: u32, cx: f32, cy: f32, radius: f32) -> Image<Rgba<u8>> {
    let mask = create_disc_mask(width, height, cx, cy, radius);
    Image::from_fn(width, height, |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            Rgba([230, 180, 140, 255])
        } else {
            Rgba([20, 60, 90, 255])
        }
    })
}

/// Compares two pixels channel by channel within `tolerance`
#[cfg(test)]
pub fn pixels_approx_equal<P>(expected: P, actual: P, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    expected
        .channels()
        .iter()
        .zip(actual.channels())
        .all(|(e, a)| (f32::from(*e) - f32::from(*a)).abs() <= tolerance)
}

/// Compares two images pixel by pixel within `tolerance`
#[cfg(test)]
pub fn images_approx_equal<P>(expected: &Image<P>, actual: &Image<P>, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    expected.dimensions() == actual.dimensions()
        && expected
            .pixels()
            .zip(actual.pixels())
            .all(|(e, a)| pixels_approx_equal(*e, *a, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_test_rgba_image_with_valid_input_creates_image() {
        let image = create_test_rgba_image();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgba([200, 150, 100, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([50, 75, 25, 0]));
    }

    #[test]
    fn create_disc_mask_marks_center_and_corners() {
        let mask = create_disc_mask(20, 20, 10.0, 10.0, 5.0);
        assert_eq!(mask.get_pixel(10, 10)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(19, 19)[0], 0);
    }

    #[test]
    fn images_approx_equal_with_tolerant_comparison_returns_true() {
        let image1 = create_test_alpha_mask();
        let mut image2 = create_test_alpha_mask();
        image2.put_pixel(0, 1, Luma([129]));

        assert!(images_approx_equal(&image1, &image2, 1.5));
        assert!(!images_approx_equal(&image1, &image2, 0.5));
        assert!(pixels_approx_equal(Rgba([1u8, 2, 3, 4]), Rgba([2, 2, 3, 4]), 1.0));
    }
}
