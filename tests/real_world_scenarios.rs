//! Real-world scenario tests for imageops-cutout
//!
//! These tests pin down the documented scenarios and simulate typical cutout
//! use cases from a raw segmentation mask to a finished composite.

use image::{Luma, Rgba};
use imageops_cutout::*;

/// Scenario A: closing+opening leaves a featureless mask alone
#[test]
fn opaque_mask_survives_morphology() {
    let mask: Image<Luma<u8>> = Image::from_pixel(100, 100, Luma([255]));
    let result = apply_closing_then_opening(&mask, 2);
    assert_eq!(result, mask);
}

/// Scenario B: a one-pixel hole is filled by dilate then erode
#[test]
fn single_pixel_hole_is_filled_by_closing() {
    let mut mask: Image<Luma<u8>> = Image::from_pixel(10, 10, Luma([255]));
    mask.put_pixel(5, 5, Luma([0]));

    let closed = erode(&dilate(&mask, 1), 1);
    assert_eq!(closed.get_pixel(5, 5)[0], 255);
    assert!(closed.pixels().all(|p| p[0] == 255));
}

/// Scenario C: a single hard erase dab clears a disc of radius 25
#[test]
fn single_erase_dab_clears_disc() {
    let mask: Image<Luma<u8>> = Image::from_pixel(100, 100, Luma([255]));
    let tool = BrushTool::new(BrushMode::Erase, 50.0, 1.0, 1.0).unwrap();
    let path = DrawingPath::from_points(tool, [DrawingPoint::new(0.5, 0.5)]);

    let edited = apply_strokes(&mask, &[path], 100, 100).unwrap();

    for (x, y, pixel) in edited.enumerate_pixels() {
        let distance = (x as f32 + 0.5 - 50.0).hypot(y as f32 + 0.5 - 50.0);
        if distance <= 24.0 {
            assert_eq!(pixel[0], 0, "pixel ({x}, {y}) inside the dab");
        } else if distance > 25.0 {
            assert_eq!(pixel[0], 255, "pixel ({x}, {y}) outside the dab");
        }
    }
}

/// Scenario D: a 0° black-to-white gradient gets brighter to the right
#[test]
fn horizontal_gradient_background() {
    let background = BackgroundSpec::Gradient {
        start: Rgba([0, 0, 0, 255]),
        end: Rgba([255, 255, 255, 255]),
        angle: 0.0,
    };
    let foreground: Image<Rgba<u8>> = Image::new(200, 100);
    let result = compose(
        &foreground,
        &background,
        200,
        100,
        None,
        &SubjectTransform::identity(),
        None,
    )
    .unwrap();

    let left = result.get_pixel(0, 50);
    let right = result.get_pixel(199, 50);
    assert!(left[0] < right[0]);
    assert_eq!(left[0], left[1]);
    assert_eq!(right[3], 255);
}

/// Scenario E: oversized inputs are clamped to the working dimension
#[test]
fn oversized_photo_is_resized_to_fit() {
    let photo: Image<Rgba<u8>> = Image::from_pixel(5000, 3000, Rgba([90, 120, 150, 255]));
    let resized = resize_to_fit(&photo, MAX_WORKING_DIMENSION);
    assert_eq!(resized.dimensions(), (4096, 2457));
}

/// Simulates a portrait: a rough segmenter mask with a speck and a pinhole
/// is cleaned up, refined against the photo, and composited on a gradient.
#[test]
fn portrait_cutout_on_gradient() {
    let (width, height) = (120, 160);
    let in_subject = |x: u32, y: u32| {
        let dx = (x as f32 - 60.0) / 35.0;
        let dy = (y as f32 - 85.0) / 55.0;
        dx * dx + dy * dy <= 1.0
    };

    let photo = Image::from_fn(width, height, |x, y| {
        if in_subject(x, y) {
            Rgba([225, 185, 150, 255])
        } else {
            Rgba([40, 70, 110, 255])
        }
    });

    let mut segmented = Image::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, _]) = *photo.get_pixel(x, y);
        Rgba([r, g, b, if in_subject(x, y) { 255 } else { 0 }])
    });
    // Segmenter noise: a stray speck outside and a pinhole inside
    segmented.put_pixel(5, 5, Rgba([40, 70, 110, 255]));
    segmented.put_pixel(60, 85, Rgba([225, 185, 150, 0]));

    let raw_mask = create_mask_from_foreground(&segmented);
    let refined = refine(&raw_mask, &photo, &RefinementPreset::Balanced.config()).unwrap();

    assert!(refined.get_pixel(5, 5)[0] <= 5, "speck removed");
    assert!(refined.get_pixel(60, 85)[0] >= 250, "pinhole filled");
    assert!(refined.get_pixel(0, 0)[0] <= 5);

    let cutout = apply_mask_to_image(&photo, &refined);
    let background = BackgroundSpec::Gradient {
        start: Rgba([255, 255, 255, 255]),
        end: Rgba([200, 200, 255, 255]),
        angle: 90.0,
    };
    let result = compose(
        &cutout,
        &background,
        width,
        height,
        Some(&photo),
        &SubjectTransform::identity(),
        None,
    )
    .unwrap();

    assert_eq!(result.get_pixel(60, 85), &Rgba([225, 185, 150, 255]));
    assert!(result.get_pixel(0, 0)[0] >= 240);
    assert!(result.pixels().all(|p| p[3] == 255));
}

/// Product shot: blurred original behind a shrunken, slightly rotated subject
#[test]
fn product_shot_on_blurred_original() {
    let (width, height) = (80, 60);
    let photo = Image::from_fn(width, height, |x, y| {
        Rgba([(x * 3) as u8, (y * 4) as u8, 128, 255])
    });
    let mask = Image::from_fn(width, height, |x, y| {
        Luma([if (25..55).contains(&x) && (15..45).contains(&y) { 255 } else { 0 }])
    });

    let cutout = apply_mask_to_image(&photo, &mask);
    let blurred = box_blur(&photo, blur_radius(6.0).unwrap());
    let transform = SubjectTransform {
        scale: 0.8,
        rotation_degrees: 10.0,
        ..SubjectTransform::identity()
    };

    let with_precomputed = compose(
        &cutout,
        &BackgroundSpec::Blur(6.0),
        width,
        height,
        Some(&photo),
        &transform,
        Some(&blurred),
    )
    .unwrap();
    let recomputed = compose(
        &cutout,
        &BackgroundSpec::Blur(6.0),
        width,
        height,
        Some(&photo),
        &transform,
        None,
    )
    .unwrap();

    assert_eq!(with_precomputed, recomputed);
    // Corners show the blurred photo
    assert_eq!(with_precomputed.get_pixel(0, 0), blurred.get_pixel(0, 0));
    // The subject centre stays on top, up to resampling
    let center = with_precomputed.get_pixel(40, 30);
    let expected = photo.get_pixel(40, 30);
    assert_eq!(center[3], 255);
    for channel in 0..3 {
        assert!(center[channel].abs_diff(expected[channel]) <= 4);
    }
}

/// Poster layout: a wide custom backdrop is cropped to a portrait canvas
#[test]
fn custom_backdrop_is_cropped_to_canvas() {
    let backdrop = Image::from_fn(300, 100, |x, _| {
        if x < 100 {
            Rgba([255, 0, 0, 255])
        } else if x < 200 {
            Rgba([0, 255, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    let foreground: Image<Rgba<u8>> = Image::new(10, 10);

    let result = compose(
        &foreground,
        &BackgroundSpec::CustomImage(backdrop),
        100,
        100,
        None,
        &SubjectTransform::identity(),
        None,
    )
    .unwrap();

    assert_eq!(result.dimensions(), (100, 100));
    assert!(result.pixels().all(|p| *p == Rgba([0, 255, 0, 255])));
}
