use std::fs::File;
use std::io::{ self, BufWriter, Write };
use std::path::Path;

use log::info;

use crate::color::Color;

/// The longest line written to a PPM file.
const PPM_LINE_WIDTH: usize = 70;

/// A frame buffer of linear colors.
///
/// Pixels live in one flat vector, row-major, at `row * width + col`. Row 0
/// is the *bottom* of the image, matching `v = 0` on the camera; writers
/// emit the top row first.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Color>,
}

impl Canvas {
    /// A black canvas.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height],
        }
    }

    /// Writes a color at column `x`, row `y`. Out-of-bounds writes are
    /// ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use whitted_tracer::color::Color;
    /// # use whitted_tracer::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// assert_eq!(canvas.read_pixel(8, 2), None);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[y * self.width + x] = *pixel;
    }

    /// Reads the color at column `x`, row `y`, or `None` if out of bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(self.pixels[y * self.width + x])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Copies a block of columns into place.
    ///
    /// `strip` holds `height` rows of `strip.len() / height` colors each,
    /// row-major, and lands at columns starting from `first_col`.
    pub fn blit_columns(&mut self, first_col: usize, strip: &[Color]) {
        if self.height == 0 {
            return;
        }

        let strip_width = strip.len() / self.height;
        for (row, colors) in strip.chunks(strip_width.max(1)).enumerate() {
            for (i, color) in colors.iter().enumerate() {
                self.write_pixel(first_col + i, row, color);
            }
        }
    }

    /// Rows from top to bottom, as image files expect them.
    fn rows_top_down(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks(self.width.max(1)).rev()
    }

    /// Saves the canvas, as PNG if `path` ends in `.png` and as plain PPM
    /// otherwise.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let is_png = path.extension()
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);

        if is_png {
            self.to_image()
                .save(path)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        } else {
            let mut out = BufWriter::new(File::create(path)?);
            self.write_ppm(&mut out)?;
            out.flush()?;
        }

        info!("Saved {}x{} render to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Writes a plain (P3) PPM.
    ///
    /// Channels are clamped and quantized with `floor(255.99 * c)`, and no
    /// line runs past 70 columns.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.rows_top_down() {
            let mut line = String::new();
            for value in row.iter().flat_map(|c| c.to_bytes()) {
                let token = value.to_string();
                if !line.is_empty() && line.len() + 1 + token.len() > PPM_LINE_WIDTH {
                    writeln!(out, "{}", line)?;
                    line.clear();
                }

                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&token);
            }

            writeln!(out, "{}", line)?;
        }

        Ok(())
    }

    /// Converts to an 8-bit image, top row first.
    pub fn to_image(&self) -> image::RgbImage {
        let mut img = image::RgbImage::new(self.width as u32, self.height as u32);
        for (y, row) in self.rows_top_down().enumerate() {
            for (x, color) in row.iter().enumerate() {
                img.put_pixel(x as u32, y as u32, image::Rgb(color.to_bytes()));
            }
        }

        img
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.pixels().len(), 200);
    assert!(c.pixels().iter().all(|p| *p == Color::black()));
}

#[test]
fn ppm_header_and_row_order() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(0, 0, &Color::rgb(1.0, 0.0, 0.0));
    c.write_pixel(1, 1, &Color::rgb(0.0, 0.5, 1.5));

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    // Row 1 is the top of the image, so it comes first
    assert_eq!(text, "P3\n2 2\n255\n0 0 0 0 127 255\n255 0 0 0 0 0\n");
}

#[test]
fn ppm_wraps_long_lines() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines.iter().all(|l| l.len() <= 70));
    assert_eq!(lines[3], "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[4], "153 255 204 153 255 204 153 255 204 153 255 204 153");
}

#[test]
fn blit_places_strip() {
    let mut c = Canvas::new(4, 2);
    let red = Color::rgb(1.0, 0.0, 0.0);
    let blue = Color::rgb(0.0, 0.0, 1.0);
    c.blit_columns(2, &[red, blue, blue, red]);

    assert_eq!(c.read_pixel(2, 0), Some(red));
    assert_eq!(c.read_pixel(3, 0), Some(blue));
    assert_eq!(c.read_pixel(2, 1), Some(blue));
    assert_eq!(c.read_pixel(3, 1), Some(red));
    assert_eq!(c.read_pixel(0, 0), Some(Color::black()));
}

#[test]
fn image_is_flipped() {
    let mut c = Canvas::new(1, 2);
    c.write_pixel(0, 0, &Color::white());
    let img = c.to_image();

    assert_eq!(img.get_pixel(0, 1).0, [255, 255, 255]);
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
}
