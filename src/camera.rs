use std::f64::consts::PI;

use rand::Rng;

use crate::consts::DEFAULT_APERTURE;
use crate::matrix::{ Matrix4, Transform };
use crate::ray::Ray;
use crate::vector::Vector3;

/// Thin-lens settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DepthOfField {
    /// Radius of the lens disk.
    pub aperture: f64,

    /// Distance along each primary ray that stays in focus.
    pub focus_distance: f64,
}

/// A camera producing primary rays for normalized image coordinates.
///
/// By default the camera is a pinhole at `position`, aimed at `look_at`.
/// Setting `use_transform` places it with `transform` instead, a
/// camera-to-world matrix for a camera at the origin looking down -Z. Setting
/// `depth_of_field` turns either into a thin-lens camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vector3,
    pub look_at: Vector3,
    pub up: Vector3,

    /// Half of the horizontal field of view, in radians.
    pub fov: f64,

    pub width: usize,
    pub height: usize,

    /// Deepest recursion level that is still shaded; primary rays are
    /// depth 0.
    pub max_bounce: usize,

    pub transform: Transform,
    pub use_transform: bool,

    pub depth_of_field: Option<DepthOfField>,
}

impl Default for Camera {
    fn default() -> Camera {
        Camera {
            position: Vector3::zero(),
            look_at: Vector3::new(0.0, 0.0, 1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: PI / 6.0,
            width: 640,
            height: 480,
            max_bounce: 5,
            transform: Transform::new(),
            use_transform: false,
            depth_of_field: None,
        }
    }
}

impl Camera {
    pub fn new(position: Vector3, look_at: Vector3, up: Vector3, fov: f64,
        width: usize, height: usize) -> Camera {
        Camera { position, look_at, up, fov, width, height, ..Default::default() }
    }

    /// The forward, right and corrected up vectors of the look-at basis.
    pub fn basis(&self) -> (Vector3, Vector3, Vector3) {
        let forward = (self.look_at - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward).normalize();

        (forward, right, up)
    }

    /// A camera-to-world matrix equivalent to the look-at placement.
    ///
    /// Handy for seeding `transform` from a position and target.
    pub fn look_at_matrix(&self) -> Matrix4 {
        let (forward, right, up) = self.basis();
        let mut m = Matrix4::identity();
        for (col, axis) in [right, up, -forward].iter().enumerate() {
            m[(0, col)] = axis.x;
            m[(1, col)] = axis.y;
            m[(2, col)] = axis.z;
        }
        m[(0, 3)] = self.position.x;
        m[(1, 3)] = self.position.y;
        m[(2, 3)] = self.position.z;

        m
    }

    /// Distance from the camera to its target, the default focus distance.
    pub fn target_distance(&self) -> f64 {
        (self.look_at - self.position).length()
    }

    /// Switches to placement by `transform`.
    ///
    /// A camera that isn't already transform-placed gets its look-at
    /// placement as the transform, so the view doesn't move.
    pub fn enable_transform(&mut self) {
        if !self.use_transform {
            self.transform = Transform::from_matrix(self.look_at_matrix());
            self.use_transform = true;
        }
    }

    /// Turns on the thin lens.
    ///
    /// Settings left as `None` keep the lens already configured, and
    /// otherwise fall back to `DEFAULT_APERTURE` and `target_distance`.
    pub fn enable_depth_of_field(&mut self, aperture: Option<f64>,
        focus_distance: Option<f64>) {
        let current = self.depth_of_field;
        let aperture = aperture
            .or_else(|| current.map(|lens| lens.aperture))
            .unwrap_or(DEFAULT_APERTURE);
        let focus_distance = focus_distance
            .or_else(|| current.map(|lens| lens.focus_distance))
            .unwrap_or_else(|| self.target_distance());

        self.depth_of_field = Some(DepthOfField { aperture, focus_distance });
    }

    /// Half extents of the image plane at distance one.
    pub fn half_extents(&self) -> (f64, f64) {
        let half_width = self.fov.tan();
        let half_height = half_width * self.height as f64 / self.width as f64;

        (half_width, half_height)
    }

    /// The ray through `(u, v)`, where `(0, 0)` is the bottom-left corner of
    /// the image and `(1, 1)` the top-right.
    pub fn generate_ray(&self, u: f64, v: f64) -> Ray {
        self.generate_ray_with(u, v, &mut rand::thread_rng())
    }

    /// Like `generate_ray`, drawing lens samples from `rng`.
    pub fn generate_ray_with<R: Rng>(&self, u: f64, v: f64, rng: &mut R) -> Ray {
        let (half_width, half_height) = self.half_extents();
        let du = 2.0 * half_width * (u - 0.5);
        let dv = 2.0 * half_height * (v - 0.5);

        let (origin, direction, right, up) = if self.use_transform {
            let t = &self.transform;
            (
                t.transform_point(Vector3::zero()),
                t.transform_direction(Vector3::new(du, dv, -1.0)),
                t.transform_direction(Vector3::new(1.0, 0.0, 0.0)),
                t.transform_direction(Vector3::new(0.0, 1.0, 0.0)),
            )
        } else {
            let (forward, right, up) = self.basis();
            let direction = (forward + right * du + up * dv).normalize();
            (self.position, direction, right, up)
        };

        let lens = match self.depth_of_field {
            Some(lens) if lens.aperture > 0.0 => lens,
            _ => return Ray::new(origin, direction),
        };

        // Uniform sample on the lens disk
        let r = lens.aperture * rng.gen::<f64>().sqrt();
        let theta = 2.0 * PI * rng.gen::<f64>();
        let offset = right * (r * theta.cos()) + up * (r * theta.sin());

        let target = direction * lens.focus_distance;
        Ray::new(origin + offset, target - offset)
    }
}

#[cfg(test)]
fn looking_down_z() -> Camera {
    Camera::new(
        Vector3::new(0.0, 0.0, -5.0),
        Vector3::zero(),
        Vector3::new(0.0, 1.0, 0.0),
        std::f64::consts::FRAC_PI_4,
        2,
        2,
    )
}

#[test]
fn center_ray_points_forward() {
    let c = looking_down_z();
    let r = c.generate_ray(0.5, 0.5);

    assert_eq!(r.origin, Vector3::new(0.0, 0.0, -5.0));
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn corner_ray_spans_fov() {
    let c = looking_down_z();
    let r = c.generate_ray(0.0, 0.0);

    // tan(45deg) == 1, and right is -X for this basis
    assert_eq!(r.direction, Vector3::new(1.0, -1.0, 1.0).normalize());
}

#[test]
fn aspect_ratio_shrinks_height() {
    let mut c = looking_down_z();
    c.width = 4;
    c.height = 2;
    let (hw, hh) = c.half_extents();

    assert!(crate::feq(hw, 1.0));
    assert!(crate::feq(hh, 0.5));
}

#[test]
fn transform_matches_look_at() {
    let c = looking_down_z();
    let mut t = c.clone();
    t.transform = Transform::from_matrix(c.look_at_matrix());
    t.use_transform = true;

    for (u, v) in [(0.5, 0.5), (0.0, 0.0), (0.25, 0.9)] {
        let a = c.generate_ray(u, v);
        let b = t.generate_ray(u, v);
        assert_eq!(a.origin, b.origin);
        assert_eq!(a.direction, b.direction);
    }
}

#[test]
fn transform_places_camera() {
    let mut c = Camera::default();
    c.use_transform = true;
    c.transform = Transform::new().translate(Vector3::new(0.0, 2.0, 0.0));
    let r = c.generate_ray(0.5, 0.5);

    assert_eq!(r.origin, Vector3::new(0.0, 2.0, 0.0));
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn depth_of_field_keeps_focus_point() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    let mut c = looking_down_z();
    c.depth_of_field = Some(DepthOfField { aperture: 0.5, focus_distance: 5.0 });
    let mut rng = StdRng::seed_from_u64(7);

    let pinhole = looking_down_z().generate_ray(0.3, 0.6);
    let focus = pinhole.position(5.0);

    for _ in 0..8 {
        let r = c.generate_ray_with(0.3, 0.6, &mut rng);
        let lens_offset = r.origin - pinhole.origin;
        assert!(lens_offset.length() <= 0.5 + 1e-9);

        // Every lens ray passes through the in-focus point
        let t = (focus - r.origin).length();
        assert_eq!(r.position(t), focus);
    }
}

#[test]
fn zero_aperture_is_pinhole() {
    let mut c = looking_down_z();
    c.depth_of_field = Some(DepthOfField { aperture: 0.0, focus_distance: 5.0 });

    assert_eq!(c.generate_ray(0.2, 0.2), looking_down_z().generate_ray(0.2, 0.2));
}

#[test]
fn enabling_transform_keeps_the_view() {
    let c = looking_down_z();
    let mut t = c.clone();
    t.enable_transform();

    assert!(t.use_transform);
    let (a, b) = (c.generate_ray(0.25, 0.75), t.generate_ray(0.25, 0.75));
    assert_eq!(a.origin, b.origin);
    assert_eq!(a.direction, b.direction);
}

#[test]
fn enabling_transform_keeps_an_explicit_one() {
    let mut c = looking_down_z();
    c.transform = Transform::new().translate(Vector3::new(0.0, 2.0, 0.0));
    c.use_transform = true;
    c.enable_transform();

    assert_eq!(c.generate_ray(0.5, 0.5).origin, Vector3::new(0.0, 2.0, 0.0));
}

#[test]
fn enabling_lens_layers_settings() {
    use crate::consts::DEFAULT_APERTURE;

    // Nothing configured: defaults
    let mut c = looking_down_z();
    c.enable_depth_of_field(None, None);
    assert_eq!(c.depth_of_field,
        Some(DepthOfField { aperture: DEFAULT_APERTURE, focus_distance: 5.0 }));

    // A configured lens survives, only the given setting changes
    let mut c = looking_down_z();
    c.depth_of_field = Some(DepthOfField { aperture: 0.4, focus_distance: 8.0 });
    c.enable_depth_of_field(None, None);
    assert_eq!(c.depth_of_field, Some(DepthOfField { aperture: 0.4, focus_distance: 8.0 }));

    c.enable_depth_of_field(Some(0.2), None);
    assert_eq!(c.depth_of_field, Some(DepthOfField { aperture: 0.2, focus_distance: 8.0 }));
}
