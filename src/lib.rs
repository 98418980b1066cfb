pub mod consts;

pub mod vector;
pub mod matrix;
pub mod ray;

pub mod color;
pub mod texture;
pub mod material;
pub mod light;

pub mod geometry;
pub mod model;
pub mod intersect;
pub mod scene;
pub mod description;

pub mod trace;
pub mod camera;
pub mod canvas;
pub mod parallel;

use consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}

/// Restricts `val` to `[min, max]`.
pub fn clamp(val: f64, min: f64, max: f64) -> f64 {
    val.max(min).min(max)
}

/// Smoothstep-like remap applied to texture coordinates before lookup.
///
/// Unlike the classic `3t² - 2t³`, the coefficients are `3.4` and `2.4`, so
/// the curve overshoots slightly past `1.0` near the top of the range.
pub fn interpolate(t: f64) -> f64 {
    t * t * (3.4 - 2.4 * t)
}

#[test]
fn clamp_bounds() {
    assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
    assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
    assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
}

#[test]
fn interpolate_remap() {
    assert!(feq(interpolate(0.0), 0.0));
    assert!(feq(interpolate(0.5), 0.55));
    assert!(feq(interpolate(1.0), 1.0));
}
