//! Decoded RGB rasters and the samplers that read them.

use std::path::Path;

use log::{ debug, warn };
use rand::Rng;
use thiserror::Error;

use crate::color::Color;
use crate::vector::Vector2;

/// Errors that can occur while decoding a texture file.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// An RGB raster, stored row-major from the first decoded row.
///
/// A texture that failed to load is kept around in an invalid state rather
/// than dropped, so a material can still report which file it wanted. Check
/// `is_valid` before sampling; sampling an invalid texture yields black.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Color>,

    /// Where the raster came from, for diagnostics.
    pub path: String,
}

impl Texture {
    /// Loads a texture, degrading to an invalid texture on failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Texture {
        let path = path.as_ref();
        match Texture::try_load(path) {
            Ok(texture) => texture,
            Err(e) => {
                warn!("Failed to load texture {}: {}", path.display(), e);
                Texture { path: path.display().to_string(), ..Default::default() }
            }
        }
    }

    /// Decodes a texture file. Channels past RGB are dropped.
    pub fn try_load<P: AsRef<Path>>(path: P) -> TextureResult<Texture> {
        let path = path.as_ref();
        let raster = image::open(path)?.to_rgb8();
        let (width, height) = (raster.width() as usize, raster.height() as usize);
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.display().to_string()));
        }

        let pixels = raster.pixels()
            .map(|p| Color::rgb(
                p[0] as f64 / 255.0,
                p[1] as f64 / 255.0,
                p[2] as f64 / 255.0,
            ))
            .collect();

        debug!("Loaded texture: {} ({}x{})", path.display(), width, height);

        Ok(Texture { width, height, pixels, path: path.display().to_string() })
    }

    /// Builds a texture from pixels already in memory.
    ///
    /// Returns an invalid texture if `pixels` doesn't hold exactly
    /// `width * height` colors.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Texture {
        if pixels.len() != width * height {
            return Texture::default();
        }

        Texture { width, height, pixels, path: "<memory>".into() }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.width * self.height
    }

    /// Texel lookup with both indices clamped to the raster.
    fn texel(&self, x: isize, y: isize) -> Color {
        if !self.is_valid() {
            return Color::black();
        }

        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.pixels[y * self.width + x]
    }

    /// Bilinear lookup at texture coordinates.
    ///
    /// `uv` maps onto `[0, width] x [0, height]`; lookups that fall outside
    /// the raster read the nearest edge texel instead of wrapping.
    pub fn sample(&self, uv: Vector2) -> Color {
        let x = uv.u * self.width as f64;
        let y = uv.v * self.height as f64;

        let (x0, y0) = (x.floor(), y.floor());
        let (dx, dy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let c0 = c00 * (1.0 - dx) + c10 * dx;
        let c1 = c01 * (1.0 - dx) + c11 * dx;

        c0 * (1.0 - dy) + c1 * dy
    }

    /// Averages `samples` lookups, each jittered by up to one texel.
    pub fn sample_super(&self, uv: Vector2, samples: usize) -> Color {
        if samples == 0 {
            return self.sample(uv);
        }

        let mut rng = rand::thread_rng();
        let texel_u = 1.0 / self.width.max(1) as f64;
        let texel_v = 1.0 / self.height.max(1) as f64;

        let total: Color = (0..samples)
            .map(|_| {
                let jitter = Vector2::new(
                    rng.gen::<f64>() * texel_u,
                    rng.gen::<f64>() * texel_v
                );
                self.sample(uv + jitter)
            })
            .sum();

        total / samples as f64
    }
}

#[cfg(test)]
fn checker() -> Texture {
    Texture::from_pixels(2, 2, vec![
        Color::black(), Color::white(),
        Color::white(), Color::black(),
    ])
}

#[test]
fn invalid_texture_samples_black() {
    let t = Texture::load("definitely/not/a/texture.png");

    assert!(!t.is_valid());
    assert_eq!(t.path, "definitely/not/a/texture.png");
    assert_eq!(t.sample(Vector2::new(0.5, 0.5)), Color::black());
}

#[test]
fn mismatched_pixels_are_invalid() {
    let t = Texture::from_pixels(2, 2, vec![Color::white()]);

    assert!(!t.is_valid());
}

#[test]
fn sample_on_texel_corner() {
    let t = checker();

    assert_eq!(t.sample(Vector2::new(0.0, 0.0)), Color::black());
    assert_eq!(t.sample(Vector2::new(0.5, 0.0)), Color::white());
    assert_eq!(t.sample(Vector2::new(0.0, 0.5)), Color::white());
}

#[test]
fn sample_blends_neighbours() {
    let t = checker();

    assert_eq!(t.sample(Vector2::new(0.25, 0.0)), Color::gray(0.5));
    assert_eq!(t.sample(Vector2::new(0.25, 0.25)), Color::gray(0.5));
}

#[test]
fn sample_clamps_outside_raster() {
    let t = Texture::from_pixels(2, 1, vec![Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 0.0, 1.0)]);

    assert_eq!(t.sample(Vector2::new(-3.0, 0.0)), Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(t.sample(Vector2::new(7.0, 4.0)), Color::rgb(0.0, 0.0, 1.0));
}

#[test]
fn super_sample_of_flat_texture_is_flat() {
    let t = Texture::from_pixels(4, 4, vec![Color::rgb(0.2, 0.4, 0.6); 16]);

    assert_eq!(t.sample_super(Vector2::new(0.3, 0.7), 4), Color::rgb(0.2, 0.4, 0.6));
}

#[test]
fn missing_file_is_an_image_error() {
    let path = "no/such/texture.png";

    assert!(matches!(Texture::try_load(path), Err(TextureError::Image(_))));
    assert!(!Texture::load(path).is_valid());
}
