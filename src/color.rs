use std::iter::Sum;
use std::ops::{ Add, Sub, Mul, Div };

use crate::{ clamp, feq };

/// A linear RGB color.
///
/// Components are nominally in `[0.0, 1.0]`, but shading is free to push them
/// outside that range; clamping happens only when a color is quantized for
/// output.
///
/// # Examples
///
/// Tint a surface by a light:
///
/// ```
/// # use whitted_tracer::color::Color;
/// let surface = Color::rgb(1.0, 0.5, 0.0);
/// let light = Color::rgb(0.5, 0.5, 0.5);
/// assert_eq!(surface * light, Color::rgb(0.5, 0.25, 0.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Colors are compared component-wise, allowing for float error.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(c: [f64; 3]) -> Color {
        Color { r: c[0], g: c[1], b: c[2] }
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color { r: 0.0, g: 0.0, b: 0.0 }
    }

    pub fn white() -> Color {
        Color { r: 1.0, g: 1.0, b: 1.0 }
    }

    /// A gray with every channel set to `v`.
    pub fn gray(v: f64) -> Color {
        Color { r: v, g: v, b: v }
    }

    /// The mean of the three channels.
    pub fn luminance(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Clamps every channel to `[0.0, 1.0]`.
    pub fn clamped(&self) -> Color {
        Color {
            r: clamp(self.r, 0.0, 1.0),
            g: clamp(self.g, 0.0, 1.0),
            b: clamp(self.b, 0.0, 1.0),
        }
    }

    /// Quantizes to 8 bits per channel as `floor(255.99 * c)`, after
    /// clamping.
    pub fn to_bytes(&self) -> [u8; 3] {
        let c = self.clamped();
        let q = |v: f64| (255.99 * v) as u8;

        [q(c.r), q(c.g), q(c.b)]
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Color {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        other * self
    }
}

/// Component-wise (Hadamard) product, used for tinting.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
        }
    }
}

impl Div<f64> for Color {
    type Output = Color;

    fn div(self, other: f64) -> Color {
        self * (1.0 / other)
    }
}

impl Sum for Color {
    fn sum<I: Iterator<Item = Color>>(iter: I) -> Color {
        iter.fold(Color::black(), |acc, c| acc + c)
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn subtract_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn scale_colors() {
    let c = Color::rgb(0.2, 0.3, 0.4);

    assert_eq!(c * 2.0, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(2.0 * c, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(c / 2.0, Color::rgb(0.1, 0.15, 0.2));
}

#[test]
fn sum_colors() {
    let total: Color = vec![Color::gray(0.25); 4].into_iter().sum();

    assert_eq!(total, Color::white());
}

#[test]
fn quantize_clamps_and_floors() {
    assert_eq!(Color::rgb(1.5, -0.2, 0.5).to_bytes(), [255, 0, 127]);
    assert_eq!(Color::white().to_bytes(), [255, 255, 255]);
    assert_eq!(Color::black().to_bytes(), [0, 0, 0]);
}
