use std::ops::Range;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::thread;
use std::time::Instant;

use log::{ debug, info };

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::consts::{ DEFAULT_THREADS, SUPERSAMPLE_GRID };
use crate::scene::Scene;
use crate::trace::ray_trace;

/// Settings for the frame driver.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Number of workers, one per column strip.
    pub threads: usize,

    /// Average a grid of sub-pixel samples instead of one ray per pixel.
    pub supersample: bool,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_THREADS);

        RenderConfig { threads, supersample: false }
    }
}

/// Splits `width` columns into at most `workers` contiguous strips.
///
/// Strips are equally wide except the last, which also takes the columns
/// left over by the division. Every column lands in exactly one strip.
pub fn column_strips(width: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, width.max(1));
    let strip_width = width / workers;

    (0..workers)
        .map(|i| {
            let start = i * strip_width;
            let end = if i + 1 == workers { width } else { start + strip_width };
            start..end
        })
        .collect()
}

/// One worker's share of the frame.
struct Strip<'a> {
    columns: Range<usize>,
    scene: &'a Scene,
    camera: &'a Camera,
    supersample: bool,
    progress: &'a AtomicUsize,
}

impl<'a> Strip<'a> {
    /// Renders every row of this strip into a strip-local buffer,
    /// row-major.
    fn render(&self) -> Vec<Color> {
        let (width, height) = (self.camera.width, self.camera.height);
        let mut out = Vec::with_capacity(self.columns.len() * height);

        for j in 0..height {
            for i in self.columns.clone() {
                out.push(self.shade_pixel(i, j));
            }

            let done = self.progress.fetch_add(self.columns.len(), Ordering::Relaxed)
                + self.columns.len();
            if j % 64 == 0 {
                debug!("{:.1}% of pixels rendered",
                    100.0 * done as f64 / (width * height) as f64);
            }
        }

        out
    }

    /// Pixel `(i, j)` maps to `u = i / width`, `v = j / height`. Sub-samples
    /// are spread over a pixel-sized grid centered on that same point.
    fn shade_pixel(&self, i: usize, j: usize) -> Color {
        let (w, h) = (self.camera.width as f64, self.camera.height as f64);
        let sample = |u: f64, v: f64| {
            let ray = self.camera.generate_ray(u, v);
            ray_trace(&ray, self.scene, self.camera, 0)
        };

        if !self.supersample {
            return sample(i as f64 / w, j as f64 / h);
        }

        let n = SUPERSAMPLE_GRID;
        let total: Color = (0..n * n)
            .map(|k| {
                let sx = ((k % n) as f64 + 0.5) / n as f64 - 0.5;
                let sy = ((k / n) as f64 + 0.5) / n as f64 - 0.5;
                sample((i as f64 + sx) / w, (j as f64 + sy) / h)
            })
            .sum();

        total / (n * n) as f64
    }
}

/// Renders `scene` as seen by `camera`.
///
/// The image is cut into vertical strips, one per worker thread. Workers
/// share the scene and camera read-only and each fills its own buffer, so
/// nothing is locked; the strips are stitched into the canvas once every
/// worker has been joined.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig) -> Canvas {
    let mut canvas = Canvas::new(camera.width, camera.height);
    if camera.width == 0 || camera.height == 0 {
        return canvas;
    }

    let strips = column_strips(camera.width, config.threads);
    let progress = AtomicUsize::new(0);
    let start = Instant::now();

    info!("Rendering {}x{} using {} threads ({} spheres, {} triangles)...",
        camera.width, camera.height, strips.len(),
        scene.spheres.len(), scene.triangle_count());

    let rendered: Vec<(usize, Vec<Color>)> = thread::scope(|s| {
        let handles: Vec<_> = strips.iter()
            .map(|columns| {
                let strip = Strip {
                    columns: columns.clone(),
                    scene,
                    camera,
                    supersample: config.supersample,
                    progress: &progress,
                };
                s.spawn(move || (strip.columns.start, strip.render()))
            })
            .collect();

        handles.into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    for (first_col, pixels) in rendered.iter() {
        canvas.blit_columns(*first_col, pixels);
    }

    info!("...done in {:.2?}.", start.elapsed());
    canvas
}

#[test]
fn strips_cover_every_column_once() {
    for (width, workers) in [(10, 3), (16, 16), (3, 8), (1, 1), (100, 7)] {
        let strips = column_strips(width, workers);
        let covered: Vec<usize> = strips.iter().flat_map(|r| r.clone()).collect();

        assert_eq!(covered, (0..width).collect::<Vec<_>>());
        assert!(strips.len() <= workers);
    }
}

#[test]
fn last_strip_takes_remainder() {
    let strips = column_strips(10, 3);

    assert_eq!(strips, vec![0..3, 3..6, 6..10]);
}

#[cfg(test)]
fn end_to_end_scene() -> Scene {
    use crate::geometry::Sphere;
    use crate::light::Light;
    use crate::material::{ Material, MaterialKind };
    use crate::vector::Vector3;

    let mut camera = Camera::new(
        Vector3::new(0.0, 0.0, -5.0),
        Vector3::zero(),
        Vector3::new(0.0, 1.0, 0.0),
        std::f64::consts::FRAC_PI_4,
        2,
        2,
    );
    camera.max_bounce = 0;

    let mut scene = Scene::new(camera);
    scene.spheres.push(Sphere::new(Vector3::zero(), 1.0,
        Material::new(MaterialKind::Solid(Color::white())).with_optics(0.0, 0.0, 1.0)));
    scene.lights.push(Light::point(Vector3::new(0.0, 5.0, 0.0), Color::white()));

    scene
}

#[test]
fn two_by_two_sphere() {
    let scene = end_to_end_scene();
    let config = RenderConfig { threads: 2, supersample: false };
    let canvas = render(&scene, &scene.camera, &config);

    // Only pixel (1, 1) maps to the image center; the rest miss. The light
    // sits above the sphere's silhouette, so the center gets ambient only.
    let center = canvas.read_pixel(1, 1).unwrap();
    assert_eq!(center, Color::gray(0.3));
    assert_eq!(canvas.read_pixel(0, 0), Some(Color::black()));
    assert_eq!(canvas.read_pixel(1, 0), Some(Color::black()));
    assert_eq!(canvas.read_pixel(0, 1), Some(Color::black()));
}

#[test]
fn two_by_two_sphere_lit_from_the_front() {
    use crate::light::Light;
    use crate::vector::Vector3;

    let mut scene = end_to_end_scene();
    scene.lights = vec![Light::point(Vector3::new(0.0, 5.0, -5.0), Color::white())];
    let config = RenderConfig { threads: 2, supersample: false };
    let canvas = render(&scene, &scene.camera, &config);

    // Diffuse light on top of the 0.3 ambient term
    let center = canvas.read_pixel(1, 1).unwrap();
    assert!(center.r > 0.3 && center.g > 0.3 && center.b > 0.3);
    assert_eq!(canvas.read_pixel(0, 0), Some(Color::black()));
}

#[test]
fn thread_count_does_not_change_image() {
    let mut scene = end_to_end_scene();
    scene.camera.width = 7;
    scene.camera.height = 5;

    let one = render(&scene, &scene.camera, &RenderConfig { threads: 1, supersample: false });
    let many = render(&scene, &scene.camera, &RenderConfig { threads: 3, supersample: false });

    assert_eq!(one, many);
}

#[test]
fn extra_bounce_without_mirrors_changes_nothing() {
    let mut scene = end_to_end_scene();
    scene.camera.width = 6;
    scene.camera.height = 6;
    let config = RenderConfig { threads: 2, supersample: false };

    let flat = render(&scene, &scene.camera, &config);
    scene.camera.max_bounce = 1;
    let deeper = render(&scene, &scene.camera, &config);

    assert_eq!(flat, deeper);
}

/// An unlit sphere of radius 3 filling the middle of an 8x8 frame. Every
/// hit shades to the flat ambient gray 0.3.
#[cfg(test)]
fn ambient_disk_scene() -> Scene {
    let mut scene = end_to_end_scene();
    scene.lights.clear();
    scene.spheres[0].radius = 3.0;
    scene.camera.width = 8;
    scene.camera.height = 8;

    scene
}

#[test]
fn supersampling_keeps_flat_regions() {
    let scene = ambient_disk_scene();
    let plain = render(&scene, &scene.camera, &RenderConfig { threads: 2, supersample: false });
    let smooth = render(&scene, &scene.camera, &RenderConfig { threads: 2, supersample: true });

    for j in 3..=5 {
        for i in 3..=5 {
            assert_eq!(plain.read_pixel(i, j), Some(Color::gray(0.3)));
            assert_eq!(smooth.read_pixel(i, j), plain.read_pixel(i, j));
        }
    }
}

#[test]
fn supersampling_averages_edges() {
    let scene = ambient_disk_scene();
    let canvas = render(&scene, &scene.camera, &RenderConfig { threads: 1, supersample: true });

    // Column 1 straddles the silhouette: its inner two sub-samples hit the
    // sphere and its outer two miss, on both sides of the image
    assert_eq!(canvas.read_pixel(1, 4), Some(Color::gray(0.15)));
    assert_eq!(canvas.read_pixel(7, 4), Some(Color::gray(0.15)));
    assert_eq!(canvas.read_pixel(0, 0), Some(Color::black()));
}
