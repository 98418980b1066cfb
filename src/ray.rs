use crate::vector::Vector3;
use crate::matrix::Matrix4;

/// A ray: an origin and a unit direction.
///
/// The direction is normalized on construction, so every consumer can rely
/// on it being unit length.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

impl Ray {
    pub fn new(origin: Vector3, direction: Vector3) -> Ray {
        Ray { origin, direction: direction.normalize() }
    }

    /// A ray starting slightly off `point` along `direction`, so that it
    /// doesn't immediately hit the surface it leaves.
    pub fn offset(point: Vector3, direction: Vector3, bias: f64) -> Ray {
        let direction = direction.normalize();
        Ray { origin: point + direction * bias, direction }
    }

    pub fn position(&self, t: f64) -> Vector3 {
        self.origin + self.direction * t
    }

    /// Applies `m` to both origin and direction.
    ///
    /// The direction keeps the scale the matrix gives it, so `t` values found
    /// against the transformed ray are valid on the original one.
    pub fn transform(&self, m: &Matrix4) -> Ray {
        Ray {
            origin: m.transform_point(self.origin),
            direction: m.transform_vector(self.direction),
        }
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(Vector3::new(2.0, 3.0, 4.0), Vector3::new(1.0, 0.0, 0.0));

    assert_eq!(r.position(0.0), Vector3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vector3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vector3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vector3::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_direction_normalized() {
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 3.0, 4.0));

    assert_eq!(r.direction, Vector3::new(0.0, 0.6, 0.8));
}

#[test]
fn offset_ray_starts_past_surface() {
    let r = Ray::offset(Vector3::zero(), Vector3::new(0.0, 2.0, 0.0), 0.001);

    assert_eq!(r.origin, Vector3::new(0.0, 0.001, 0.0));
    assert_eq!(r.direction, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn ray_scaling() {
    let r = Ray::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 1.0, 0.0));
    let t = r.transform(&Matrix4::scaling(2.0, 3.0, 4.0));

    assert_eq!(t.origin, Vector3::new(2.0, 6.0, 12.0));
    assert_eq!(t.direction, Vector3::new(0.0, 3.0, 0.0));
}
