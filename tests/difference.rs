//! Difference metric tests.

use image::{GrayImage, Luma};
use slidegen::{
    ComparisonSize, SimilarityMetric, SlideError, StructuralSimilarity,
    difference::difference,
};

fn checkerboard(width: u32, height: u32, block: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if (x / block + y / block) % 2 == 0 {
            Luma([30])
        } else {
            Luma([220])
        }
    })
}

fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let mut value = x.wrapping_mul(0x1f1f_1f1f)
            ^ y.wrapping_mul(0x3c6e_f372)
            ^ seed.wrapping_mul(0x9e37_79b9);
        value ^= value >> 15;
        value = value.wrapping_mul(0x2c1b_3c6d);
        value ^= value >> 12;
        value = value.wrapping_mul(0x297a_2d39);
        value ^= value >> 15;
        Luma([(value >> 24) as u8])
    })
}

// ── Percent difference ─────────────────────────────────────────────

#[test]
fn identical_images_have_zero_difference() {
    let metric = StructuralSimilarity::default();
    for image in [checkerboard(64, 48, 5), noise(64, 48, 7)] {
        assert_eq!(difference(&metric, &image, &image).unwrap(), 0.0);
    }
}

#[test]
fn difference_is_within_percent_range() {
    let metric = StructuralSimilarity::default();
    let pairs = [
        (checkerboard(64, 48, 4), checkerboard(64, 48, 9)),
        (noise(64, 48, 1), noise(64, 48, 2)),
        (checkerboard(64, 48, 4), GrayImage::new(64, 48)),
    ];
    for (first, second) in pairs {
        let percent = difference(&metric, &first, &second).unwrap();
        assert!((0.0..=100.0).contains(&percent), "percent was {percent}");
    }
}

#[test]
fn unrelated_images_are_far_apart() {
    let metric = StructuralSimilarity::default();
    let percent = difference(&metric, &noise(64, 48, 1), &noise(64, 48, 99)).unwrap();
    assert!(percent > 50.0, "percent was {percent}");
}

#[test]
fn small_change_is_small_difference() {
    let metric = StructuralSimilarity::default();
    let original = checkerboard(64, 48, 8);
    let mut edited = original.clone();
    edited.put_pixel(30, 20, Luma([128]));

    let percent = difference(&metric, &original, &edited).unwrap();
    assert!(percent > 0.0);
    assert!(percent < 5.0, "percent was {percent}");
}

#[test]
fn difference_is_symmetric() {
    let metric = StructuralSimilarity::default();
    let first = checkerboard(40, 30, 3);
    let second = noise(40, 30, 5);
    assert_eq!(
        difference(&metric, &first, &second).unwrap(),
        difference(&metric, &second, &first).unwrap()
    );
}

// ── Errors ─────────────────────────────────────────────────────────

#[test]
fn mismatched_dimensions_are_rejected() {
    let result = difference(
        &StructuralSimilarity::default(),
        &GrayImage::new(64, 48),
        &GrayImage::new(48, 64),
    );
    assert!(matches!(
        result,
        Err(SlideError::DimensionMismatch {
            left: (64, 48),
            right: (48, 64)
        })
    ));
}

#[test]
fn images_smaller_than_window_are_rejected() {
    let tiny = GrayImage::new(6, 6);
    let result = StructuralSimilarity::default().similarity(&tiny, &tiny);
    assert!(matches!(result, Err(SlideError::InvalidComparison(_))));

    let exact = GrayImage::new(7, 7);
    assert!(StructuralSimilarity::default().similarity(&exact, &exact).is_ok());
}

#[test]
fn comparison_size_is_checked_against_window() {
    let metric = StructuralSimilarity::default();
    assert!(metric.validate(ComparisonSize::default()).is_ok());
    assert!(metric.validate(ComparisonSize::new(7, 7)).is_ok());
    assert!(matches!(
        metric.validate(ComparisonSize::new(4, 4)),
        Err(SlideError::InvalidComparison(_))
    ));
    assert!(metric.validate(ComparisonSize::new(720, 6)).is_err());

    let boxed: Box<dyn SimilarityMetric> = Box::new(StructuralSimilarity::with_window(11).unwrap());
    assert!(boxed.validate(ComparisonSize::new(10, 10)).is_err());
}

// ── Window ─────────────────────────────────────────────────────────

#[test]
fn default_window_is_seven() {
    assert_eq!(StructuralSimilarity::default().window(), 7);
}

#[test]
fn window_must_be_odd_and_at_least_three() {
    assert!(StructuralSimilarity::with_window(3).is_ok());
    assert!(StructuralSimilarity::with_window(11).is_ok());
    assert!(StructuralSimilarity::with_window(1).is_err());
    assert!(StructuralSimilarity::with_window(8).is_err());
}

#[test]
fn boxed_metric_scores_like_inner() {
    let boxed: Box<dyn SimilarityMetric> = Box::new(StructuralSimilarity::default());
    let first = checkerboard(32, 32, 4);
    let second = noise(32, 32, 3);
    assert_eq!(
        difference(&boxed, &first, &second).unwrap(),
        difference(&StructuralSimilarity::default(), &first, &second).unwrap()
    );
}
