use std::ops::{ Add, Sub, Neg, Mul, Div };

use crate::feq;

/// A 2D vector, used for texture coordinates.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector2 {
    pub u: f64,
    pub v: f64,
}

impl PartialEq for Vector2 {
    fn eq(&self, other: &Vector2) -> bool {
        feq(self.u, other.u) && feq(self.v, other.v)
    }
}

impl Vector2 {
    pub fn new(u: f64, v: f64) -> Vector2 {
        Vector2 { u, v }
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self { u: self.u + other.u, v: self.v + other.v }
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self { u: self.u * other, v: self.v * other }
    }
}

/// A 3D vector.
///
/// Used for points, directions and normals alike. Whether a value is a
/// position or a direction is up to the caller; anything consumed as a
/// direction is expected to be unit length.
///
/// # Examples
///
/// ```
/// # use whitted_tracer::vector::Vector3;
/// let x = Vector3::new(1.0, 0.0, 0.0);
/// let y = Vector3::new(0.0, 1.0, 0.0);
/// assert_eq!(x.cross(&y), Vector3::new(0.0, 0.0, 1.0));
/// ```
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vector3 {
    fn eq(&self, other: &Vector3) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Vector3 {
        Vector3 { x: v[0], y: v[1], z: v[2] }
    }
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3 { x, y, z }
    }

    pub fn zero() -> Vector3 {
        Vector3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns a unit vector in the same direction.
    ///
    /// A zero vector has no direction; normalizing one yields NaN components.
    pub fn normalize(&self) -> Vector3 {
        *self * (1.0 / self.length())
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Reflects a direction across a normal.
    pub fn reflect(&self, normal: &Vector3) -> Vector3 {
        *self - *normal * (2.0 * self.dot(normal))
    }

    /// Bends a direction through a surface using Snell's law.
    ///
    /// `ior` is the refractive index on the far side of the surface when the
    /// direction enters it (the cosine with `normal` is negative). When the
    /// direction is leaving, the media are swapped and the normal flipped.
    ///
    /// Returns the zero vector on total internal reflection, i.e. when no
    /// transmitted direction exists.
    ///
    /// # Examples
    ///
    /// ```
    /// # use whitted_tracer::vector::Vector3;
    /// let d = Vector3::new(1.0, -1.0, 0.0).normalize();
    /// let n = Vector3::new(0.0, 1.0, 0.0);
    /// assert_eq!(d.refract(&n, 1.0), d);
    /// ```
    pub fn refract(&self, normal: &Vector3, ior: f64) -> Vector3 {
        let mut cosi = self.dot(normal).clamp(-1.0, 1.0);
        let mut etai = 1.0;
        let mut etat = ior;
        let mut n = *normal;

        if cosi < 0.0 {
            cosi = -cosi;
        } else {
            std::mem::swap(&mut etai, &mut etat);
            n = -n;
        }

        let eta = etai / etat;
        let k = 1.0 - eta * eta * (1.0 - cosi * cosi);
        if k < 0.0 {
            return Vector3::zero();
        }

        *self * eta + n * (eta * cosi - k.sqrt())
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z
        }
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z
        }
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y, z: -self.z }
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other
        }
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, other: Vector3) -> Vector3 {
        other * self
    }
}

impl Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, other: f64) -> Self {
        self * (1.0 / other)
    }
}

/// A homogeneous 4D vector.
///
/// Positions carry `w == 1.0` so that translations apply to them; directions
/// carry `w == 0.0` so that they don't.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl PartialEq for Vector4 {
    fn eq(&self, other: &Vector4) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl Vector4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Vector4 {
        Vector4 { x, y, z, w }
    }

    pub fn point(p: Vector3) -> Vector4 {
        Vector4 { x: p.x, y: p.y, z: p.z, w: 1.0 }
    }

    pub fn direction(d: Vector3) -> Vector4 {
        Vector4 { x: d.x, y: d.y, z: d.z, w: 0.0 }
    }

    /// Drops the `w` component.
    pub fn xyz(&self) -> Vector3 {
        Vector3 { x: self.x, y: self.y, z: self.z }
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a = Vector3::new(3.0, -2.0, 5.0);
    let b = Vector3::new(-2.0, 3.0, 1.0);

    assert_eq!(a + b, Vector3::new(1.0, 1.0, 6.0));
}

#[test]
fn sub_vectors() {
    let a = Vector3::new(3.0, 2.0, 1.0);
    let b = Vector3::new(5.0, 6.0, 7.0);

    assert_eq!(a - b, Vector3::new(-2.0, -4.0, -6.0));
}

#[test]
fn scale_both_sides() {
    let a = Vector3::new(1.0, -2.0, 3.0);

    assert_eq!(a * 3.5, Vector3::new(3.5, -7.0, 10.5));
    assert_eq!(0.5 * a, Vector3::new(0.5, -1.0, 1.5));
    assert_eq!(a / 2.0, Vector3::new(0.5, -1.0, 1.5));
}

#[test]
fn length_and_normalize() {
    let v = Vector3::new(1.0, 2.0, 3.0);
    assert!(crate::feq(v.length(), 14.0f64.sqrt()));

    let n = Vector3::new(4.0, 0.0, 0.0).normalize();
    assert_eq!(n, Vector3::new(1.0, 0.0, 0.0));
    assert!(crate::feq(v.normalize().length(), 1.0));
}

#[test]
fn dot_and_cross() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(2.0, 3.0, 4.0);

    assert!(crate::feq(a.dot(&b), 20.0));
    assert_eq!(a.cross(&b), Vector3::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vector3::new(1.0, -2.0, 1.0));
}

#[test]
fn reflect_at_45_degrees() {
    let d = Vector3::new(1.0, -1.0, 0.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(d.reflect(&n), Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn reflect_twice_restores_direction() {
    let d = Vector3::new(0.3, -0.8, 0.2).normalize();
    let n = Vector3::new(0.1, 1.0, -0.4).normalize();

    assert_eq!(d.reflect(&n).reflect(&n), d);
}

#[test]
fn refract_same_index_passes_straight() {
    use crate::consts::VACUUM_RI;

    let d = Vector3::new(0.4, -0.9, 0.1).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);
    assert_eq!(d.refract(&n, VACUUM_RI), d);

    // Leaving the surface flips the normal, still no bend
    let up = Vector3::new(0.4, 0.9, 0.1).normalize();
    assert_eq!(up.refract(&n, VACUUM_RI), up);
}

#[test]
fn refract_bends_toward_normal() {
    use crate::consts::GLASS_RI;

    let d = Vector3::new(1.0, -1.0, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);
    let t = d.refract(&n, GLASS_RI);

    // sin(theta_t) = sin(45deg) / 1.52
    let sin_t = (0.5f64).sqrt() / GLASS_RI;
    assert!(crate::feq(t.x, sin_t));
    assert!(t.y < 0.0);
    assert!(crate::feq(t.length(), 1.0));
}

#[test]
fn refract_past_critical_angle_is_zero() {
    use crate::consts::GLASS_RI;

    // Leaving glass at a grazing angle
    let d = Vector3::new(1.0, 0.2, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert!(d.refract(&n, GLASS_RI).is_zero());
}

#[test]
fn homogeneous_conversion() {
    let p = Vector4::point(Vector3::new(1.0, 2.0, 3.0));
    let d = Vector4::direction(Vector3::new(1.0, 2.0, 3.0));

    assert_eq!(p.w, 1.0);
    assert_eq!(d.w, 0.0);
    assert_eq!(p.xyz(), d.xyz());
}
