use crate::interpolate;
use crate::intersect::Hit;
use crate::material::{ Material, spherical_uv };
use crate::matrix::{ Matrix4, Transform };
use crate::ray::Ray;
use crate::vector::{ Vector2, Vector3 };

/// A sphere, optionally placed by a local transform.
///
/// `center` and `radius` describe the sphere before the transform is
/// applied. Rays are intersected against that untransformed sphere by
/// pulling them through the inverse transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: f64,
    pub material: Material,

    inverse: Matrix4,
}

impl Sphere {
    pub fn new(center: Vector3, radius: f64, material: Material) -> Sphere {
        Sphere {
            center,
            radius,
            material,
            inverse: Matrix4::identity(),
        }
    }

    /// Places the sphere with `transform`. Returns `None` if the transform
    /// can't be inverted.
    pub fn transformed(mut self, transform: Transform) -> Option<Sphere> {
        self.inverse = transform.matrix.inverse()?;
        Some(self)
    }

    /// Both roots of the ray/sphere quadratic, smaller first, or `None` when
    /// the discriminant is negative.
    pub fn roots(&self, ray: &Ray) -> Option<(f64, f64)> {
        let local = ray.transform(&self.inverse);

        let oc = local.origin - self.center;
        let a = local.direction.dot(&local.direction);
        let b = 2.0 * oc.dot(&local.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        Some(((-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)))
    }

    /// Nearest hit in front of the ray origin.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let (t0, t1) = self.roots(ray)?;
        let t = if t0 > 0.0 {
            t0
        } else if t1 > 0.0 {
            t1
        } else {
            return None;
        };

        let local = ray.transform(&self.inverse);
        let outward = (local.position(t) - self.center) / self.radius;
        let normal = self.inverse.transposition().transform_vector(outward).normalize();

        Some(Hit {
            t,
            point: ray.position(t),
            normal,
            uv: spherical_uv(outward),
            material: &self.material,
        })
    }
}

/// Where a ray crossed a triangle: distance and barycentric weights of the
/// second and third vertices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Barycentric {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// A triangle with per-vertex normals and optional texture coordinates.
///
/// Triangles don't own a material; the model they belong to does.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vector3; 3],
    pub normals: [Vector3; 3],
    pub texcoords: Option<[Vector2; 3]>,
}

impl Triangle {
    /// A flat-shaded triangle, every vertex normal set to the face normal.
    pub fn new(vertices: [Vector3; 3]) -> Triangle {
        let [v0, v1, v2] = vertices;
        let n = (v1 - v0).cross(&(v2 - v0)).normalize();

        Triangle { vertices, normals: [n; 3], texcoords: None }
    }

    pub fn with_normals(mut self, normals: [Vector3; 3]) -> Triangle {
        self.normals = normals;
        self
    }

    pub fn with_texcoords(mut self, texcoords: [Vector2; 3]) -> Triangle {
        self.texcoords = Some(texcoords);
        self
    }

    /// Möller–Trumbore intersection, accepting distances in
    /// `[t_min, t_max]`.
    pub fn intersect(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<Barycentric> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let p = ray.direction.cross(&edge2);
        let det = edge1.dot(&p);

        // Parallel to the plane
        if det == 0.0 {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - v0;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = ray.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        if t < t_min || t > t_max {
            return None;
        }

        Some(Barycentric { t, u, v })
    }

    /// Shading normal blended from the vertex normals.
    pub fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let [n0, n1, n2] = self.normals;
        (n0 * (1.0 - u - v) + n1 * u + n2 * v).normalize()
    }

    /// Texture coordinates blended from the vertices, then remapped by
    /// `interpolate`. Without texcoords the weights themselves are used.
    pub fn uv_at(&self, u: f64, v: f64) -> Vector2 {
        let raw = match self.texcoords {
            Some([t0, t1, t2]) => t0 * (1.0 - u - v) + t1 * u + t2 * v,
            None => Vector2::new(u, v),
        };

        Vector2::new(interpolate(raw.u), interpolate(raw.v))
    }

    pub fn hit<'a>(&self, ray: &Ray, t_min: f64, t_max: f64,
        material: &'a Material) -> Option<Hit<'a>> {
        let b = self.intersect(ray, t_min, t_max)?;

        Some(Hit {
            t: b.t,
            point: ray.position(b.t),
            normal: self.normal_at(b.u, b.v),
            uv: self.uv_at(b.u, b.v),
            material,
        })
    }
}

#[cfg(test)]
fn unit_sphere() -> Sphere {
    Sphere::new(Vector3::zero(), 1.0, Material::default())
}

#[test]
fn sphere_roots_symmetric_about_center() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, 3.0), 2.0, Material::default());
    let r = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    let (t0, t1) = s.roots(&r).unwrap();
    let t_center = (s.center - r.origin).dot(&r.direction);

    assert!(crate::feq(t_center - t0, t1 - t_center));
    assert!(crate::feq(t0, 6.0));
    assert!(crate::feq(t1, 10.0));
}

#[test]
fn sphere_miss() {
    let s = unit_sphere();
    let r = Ray::new(Vector3::new(0.0, 2.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    assert!(s.roots(&r).is_none());
    assert!(s.intersect(&r).is_none());
}

#[test]
fn sphere_hit_from_outside() {
    let s = unit_sphere();
    let r = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let hit = s.intersect(&r).unwrap();

    assert!(crate::feq(hit.t, 4.0));
    assert_eq!(hit.point, Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(hit.normal, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn sphere_hit_from_inside_uses_far_root() {
    let s = unit_sphere();
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));
    let hit = s.intersect(&r).unwrap();

    assert!(crate::feq(hit.t, 1.0));
    assert_eq!(hit.normal, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn sphere_behind_ray() {
    let s = unit_sphere();
    let r = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));

    assert!(s.intersect(&r).is_none());
}

#[test]
fn transformed_sphere() {
    let t = Transform::new()
        .translate(Vector3::new(0.0, 0.0, 5.0))
        .scale(Vector3::new(2.0, 2.0, 2.0));
    let s = unit_sphere().transformed(t).unwrap();
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));
    let hit = s.intersect(&r).unwrap();

    assert!(crate::feq(hit.t, 3.0));
    assert_eq!(hit.point, Vector3::new(0.0, 0.0, 3.0));
    assert_eq!(hit.normal, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn singular_sphere_transform() {
    let t = Transform::new().scale(Vector3::new(0.0, 1.0, 1.0));

    assert!(unit_sphere().transformed(t).is_none());
}

#[cfg(test)]
fn xy_triangle() -> Triangle {
    Triangle::new([
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    ])
}

#[test]
fn triangle_centroid_barycentrics() {
    let tri = xy_triangle();
    let [a, b, c] = tri.vertices;
    let centroid = (a + b + c) / 3.0;
    let r = Ray::new(centroid + Vector3::new(0.0, 0.0, -2.0), Vector3::new(0.0, 0.0, 1.0));

    let hit = tri.intersect(&r, 0.001, f64::MAX).unwrap();
    assert!(hit.u >= 0.0 && hit.v >= 0.0);
    assert!(hit.u + hit.v <= 1.0);
    assert!(crate::feq((1.0 - hit.u - hit.v) + hit.u + hit.v, 1.0));
    assert!(crate::feq(hit.u, 1.0 / 3.0));
    assert!(crate::feq(hit.v, 1.0 / 3.0));
    assert!(crate::feq(hit.t, 2.0));
}

#[test]
fn triangle_parallel_ray() {
    let r = Ray::new(Vector3::new(0.0, -1.0, -2.0), Vector3::new(0.0, 1.0, 0.0));

    assert!(xy_triangle().intersect(&r, 0.001, f64::MAX).is_none());
}

#[test]
fn triangle_misses_past_edges() {
    let tri = xy_triangle();
    let dir = Vector3::new(0.0, 0.0, 1.0);

    // Past v1-v2 edge, past v0-v1 edge, past v0-v2 edge
    for origin in [
        Vector3::new(0.0, -1.0, -2.0),
        Vector3::new(-1.0, 1.0, -2.0),
        Vector3::new(1.0, 1.0, -2.0),
    ] {
        assert!(tri.intersect(&Ray::new(origin, dir), 0.001, f64::MAX).is_none());
    }
}

#[test]
fn triangle_respects_t_window() {
    let tri = xy_triangle();
    let r = Ray::new(Vector3::new(0.0, 0.5, -2.0), Vector3::new(0.0, 0.0, 1.0));

    assert!(tri.intersect(&r, 0.001, 1.0).is_none());
    assert!(tri.intersect(&r, 3.0, f64::MAX).is_none());
    assert!(tri.intersect(&r, 0.001, 2.5).is_some());
}

#[test]
fn triangle_interpolated_normal() {
    let tri = xy_triangle().with_normals([
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    ]);

    assert_eq!(tri.normal_at(0.45, 0.25), Vector3::new(-0.5547, 0.83205, 0.0));
}

#[test]
fn triangle_uv_uses_remap() {
    let tri = xy_triangle().with_texcoords([
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
    ]);
    let uv = tri.uv_at(0.5, 0.25);

    assert_eq!(uv, Vector2::new(interpolate(0.5), interpolate(0.25)));
}

#[test]
fn triangle_hit_carries_material() {
    let m = Material::default().with_optics(0.0, 0.0, 1.0);
    let r = Ray::new(Vector3::new(0.0, 0.5, -2.0), Vector3::new(0.0, 0.0, 1.0));
    let hit = xy_triangle().hit(&r, 0.001, f64::MAX, &m).unwrap();

    assert!(std::ptr::eq(hit.material, &m));
    assert_eq!(hit.point, Vector3::new(0.0, 0.5, 0.0));
}
