use std::ops::{ Index, IndexMut, Mul };

use crate::feq;
use crate::vector::{ Vector3, Vector4 };

/// A 4x4 affine matrix.
///
/// Elements are stored row-major and indexed with `(row, col)`. Matrices act
/// on column vectors, so `m * v` applies `m` to `v`, and `a * b` applies `b`
/// first.
///
/// # Examples
///
/// ```
/// # use whitted_tracer::vector::{ Vector3, Vector4 };
/// # use whitted_tracer::matrix::Matrix4;
/// let m = Matrix4::translation(1.0, 2.0, 3.0);
/// let p = Vector4::point(Vector3::new(1.0, 1.0, 1.0));
/// assert_eq!((m * p).xyz(), Vector3::new(2.0, 3.0, 4.0));
/// ```
#[derive(Copy, Clone, Debug, PartialOrd)]
pub struct Matrix4 {
    data: [f64; 16],
}

/// Matrices are compared element-wise, with approximate float equality.
impl PartialEq for Matrix4 {
    fn eq(&self, other: &Matrix4) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(x, y)| feq(*x, *y))
    }
}

impl Default for Matrix4 {
    fn default() -> Matrix4 {
        Matrix4::identity()
    }
}

impl Matrix4 {
    /// A matrix of zeroes.
    pub fn zero() -> Matrix4 {
        Matrix4 { data: [0.0; 16] }
    }

    pub fn identity() -> Matrix4 {
        let mut m = Self::zero();
        for i in 0..4 {
            m[(i, i)] = 1.0;
        }

        m
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4 {
        let mut m = Self::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;

        m
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4 {
        let mut m = Self::identity();
        m[(0, 0)] = x;
        m[(1, 1)] = y;
        m[(2, 2)] = z;

        m
    }

    /// Rotation about the X axis by `r` radians.
    pub fn rotation_x(r: f64) -> Matrix4 {
        let (s, c) = r.sin_cos();
        let mut m = Self::identity();
        m[(1, 1)] =  c;
        m[(1, 2)] = -s;
        m[(2, 1)] =  s;
        m[(2, 2)] =  c;

        m
    }

    /// Rotation about the Y axis by `r` radians.
    pub fn rotation_y(r: f64) -> Matrix4 {
        let (s, c) = r.sin_cos();
        let mut m = Self::identity();
        m[(0, 0)] =  c;
        m[(0, 2)] =  s;
        m[(2, 0)] = -s;
        m[(2, 2)] =  c;

        m
    }

    /// Rotation about the Z axis by `r` radians.
    pub fn rotation_z(r: f64) -> Matrix4 {
        let (s, c) = r.sin_cos();
        let mut m = Self::identity();
        m[(0, 0)] =  c;
        m[(0, 1)] = -s;
        m[(1, 0)] =  s;
        m[(1, 1)] =  c;

        m
    }

    /// Returns the transpose of this matrix.
    pub fn transposition(&self) -> Matrix4 {
        let mut t = Self::zero();
        for r in 0..4 {
            for c in 0..4 {
                t[(c, r)] = self[(r, c)];
            }
        }

        t
    }

    /// The determinant of the 3x3 matrix left after striking out `row` and
    /// `col`.
    fn minor(&self, row: usize, col: usize) -> f64 {
        let mut sub = [0.0; 9];
        let mut i = 0;
        for r in (0..4).filter(|&r| r != row) {
            for c in (0..4).filter(|&c| c != col) {
                sub[i] = self[(r, c)];
                i += 1;
            }
        }

        sub[0] * (sub[4] * sub[8] - sub[5] * sub[7])
            - sub[1] * (sub[3] * sub[8] - sub[5] * sub[6])
            + sub[2] * (sub[3] * sub[7] - sub[4] * sub[6])
    }

    /// The minor at `row`, `col`, negated when `row + col` is odd.
    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let m = self.minor(row, col);
        if (row + col) % 2 == 0 { m } else { -m }
    }

    pub fn determinant(&self) -> f64 {
        (0..4).map(|c| self[(0, c)] * self.cofactor(0, c)).sum()
    }

    /// Calculates the inverse of this matrix, if it exists.
    ///
    /// Returns `None` for a singular matrix (zero determinant), such as one
    /// containing a zero scale.
    pub fn inverse(&self) -> Option<Matrix4> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }

        let mut inv = Self::zero();
        for r in 0..4 {
            for c in 0..4 {
                inv[(c, r)] = self.cofactor(r, c) / det;
            }
        }

        Some(inv)
    }

    /// Applies this matrix to a position (`w == 1`).
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        (*self * Vector4::point(p)).xyz()
    }

    /// Applies this matrix to a direction (`w == 0`), ignoring translation.
    ///
    /// The result is not normalized.
    pub fn transform_vector(&self, d: Vector3) -> Vector3 {
        (*self * Vector4::direction(d)).xyz()
    }
}

impl From<[f64; 16]> for Matrix4 {
    fn from(data: [f64; 16]) -> Matrix4 {
        Matrix4 { data }
    }
}

impl Index<(usize, usize)> for Matrix4 {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index.0 * 4 + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix4 {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index.0 * 4 + index.1]
    }
}

/// Matrix product. Not commutative: `a * b` applies `b` first.
impl Mul<Matrix4> for Matrix4 {
    type Output = Matrix4;

    fn mul(self, other: Matrix4) -> Matrix4 {
        let mut res = Matrix4::zero();
        for r in 0..4 {
            for c in 0..4 {
                res[(r, c)] = (0..4).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }

        res
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;

    fn mul(self, v: Vector4) -> Vector4 {
        let row = |r: usize| {
            self[(r, 0)] * v.x + self[(r, 1)] * v.y
                + self[(r, 2)] * v.z + self[(r, 3)] * v.w
        };

        Vector4::new(row(0), row(1), row(2), row(3))
    }
}

/// An accumulated affine transform.
///
/// Every operation is right-multiplied onto the current matrix, so for
/// `Transform::new().translate(..).scale(..)` the scale acts on a point
/// before the translation does. Operations are never reordered.
///
/// # Examples
///
/// ```
/// # use whitted_tracer::vector::Vector3;
/// # use whitted_tracer::matrix::Transform;
/// let t = Transform::new()
///     .translate(Vector3::new(10.0, 0.0, 0.0))
///     .scale(Vector3::new(2.0, 2.0, 2.0));
/// let p = t.transform_point(Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(p, Vector3::new(12.0, 0.0, 0.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Transform {
    pub matrix: Matrix4,
}

impl Transform {
    pub fn new() -> Transform {
        Transform { matrix: Matrix4::identity() }
    }

    pub fn from_matrix(matrix: Matrix4) -> Transform {
        Transform { matrix }
    }

    fn then(self, m: Matrix4) -> Transform {
        Transform { matrix: self.matrix * m }
    }

    pub fn translate(self, offset: Vector3) -> Transform {
        self.then(Matrix4::translation(offset.x, offset.y, offset.z))
    }

    /// Rotation about X by `theta` radians.
    pub fn rotate_x(self, theta: f64) -> Transform {
        self.then(Matrix4::rotation_x(theta))
    }

    pub fn rotate_y(self, theta: f64) -> Transform {
        self.then(Matrix4::rotation_y(theta))
    }

    pub fn rotate_z(self, theta: f64) -> Transform {
        self.then(Matrix4::rotation_z(theta))
    }

    pub fn scale(self, factors: Vector3) -> Transform {
        self.then(Matrix4::scaling(factors.x, factors.y, factors.z))
    }

    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        self.matrix.transform_point(p)
    }

    /// Transforms a direction and renormalizes it.
    pub fn transform_direction(&self, d: Vector3) -> Vector3 {
        self.matrix.transform_vector(d).normalize()
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }
}

#[test]
fn identity_times_vector() {
    let v = Vector4::new(1.0, 2.0, 3.0, 4.0);

    assert_eq!(Matrix4::identity() * v, v);
}

#[test]
fn transpose() {
    let m = Matrix4::from([
        0.0, 9.0, 3.0, 0.0,
        9.0, 8.0, 0.0, 8.0,
        1.0, 8.0, 5.0, 3.0,
        0.0, 0.0, 5.0, 8.0,
    ]);
    let t = Matrix4::from([
        0.0, 9.0, 1.0, 0.0,
        9.0, 8.0, 8.0, 0.0,
        3.0, 0.0, 5.0, 5.0,
        0.0, 8.0, 3.0, 8.0,
    ]);

    assert_eq!(m.transposition(), t);
    assert_eq!(Matrix4::identity().transposition(), Matrix4::identity());
}

#[test]
fn determinant() {
    let m = Matrix4::from([
        -2.0, -8.0,  3.0,  5.0,
        -3.0,  1.0,  7.0,  3.0,
         1.0,  2.0, -9.0,  6.0,
        -6.0,  7.0,  7.0, -9.0,
    ]);

    assert_eq!(m.cofactor(0, 0), 690.0);
    assert_eq!(m.cofactor(0, 1), 447.0);
    assert_eq!(m.cofactor(0, 2), 210.0);
    assert_eq!(m.cofactor(0, 3), 51.0);
    assert_eq!(m.determinant(), -4071.0);
}

#[test]
fn inverse() {
    let m = Matrix4::from([
        -5.0,  2.0,  6.0, -8.0,
         1.0, -5.0,  1.0,  8.0,
         7.0,  7.0, -6.0, -7.0,
         1.0, -3.0,  7.0,  4.0,
    ]);
    let inv = m.inverse().unwrap();

    assert!(feq(inv[(3, 2)], -160.0 / 532.0));
    assert!(feq(inv[(2, 3)], 105.0 / 532.0));
    assert_eq!(m * inv, Matrix4::identity());
}

#[test]
fn singular_has_no_inverse() {
    assert!(Matrix4::scaling(1.0, 0.0, 1.0).inverse().is_none());
}

#[test]
fn translation_ignores_directions() {
    let m = Matrix4::translation(5.0, -3.0, 2.0);
    let d = Vector3::new(-3.0, 4.0, 5.0);

    assert_eq!(m.transform_vector(d), d);
    assert_eq!(m.transform_point(d), Vector3::new(2.0, 1.0, 7.0));
}

#[test]
fn rotations_quarter_turn() {
    use std::f64::consts::FRAC_PI_2;

    let x = Vector3::new(1.0, 0.0, 0.0);
    let y = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(Matrix4::rotation_x(FRAC_PI_2).transform_point(y),
        Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(Matrix4::rotation_y(FRAC_PI_2).transform_point(x),
        Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(Matrix4::rotation_z(FRAC_PI_2).transform_point(y),
        Vector3::new(-1.0, 0.0, 0.0));
}

#[test]
fn transform_order_is_call_order() {
    let a = Transform::new()
        .translate(Vector3::new(0.0, 1.0, 0.0))
        .scale(Vector3::new(2.0, 2.0, 2.0));
    let b = Transform::new()
        .scale(Vector3::new(2.0, 2.0, 2.0))
        .translate(Vector3::new(0.0, 1.0, 0.0));
    let p = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(a.transform_point(p), Vector3::new(0.0, 3.0, 0.0));
    assert_eq!(b.transform_point(p), Vector3::new(0.0, 4.0, 0.0));
}

#[test]
fn transform_direction_is_unit() {
    let t = Transform::new()
        .translate(Vector3::new(3.0, 3.0, 3.0))
        .scale(Vector3::new(4.0, 1.0, 1.0));
    let d = t.transform_direction(Vector3::new(1.0, 0.0, 0.0));

    assert_eq!(d, Vector3::new(1.0, 0.0, 0.0));
}
