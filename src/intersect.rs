use crate::material::Material;
use crate::vector::{ Vector2, Vector3 };

/// Everything the shader needs to know about a ray/surface hit.
#[derive(Copy, Clone, Debug)]
pub struct Hit<'a> {
    /// Distance along the ray.
    pub t: f64,

    pub point: Vector3,

    /// Outward geometric (or vertex-interpolated) normal, unit length. Not
    /// flipped toward the ray; refraction relies on the sign.
    pub normal: Vector3,

    /// Texture coordinates at the hit.
    pub uv: Vector2,

    pub material: &'a Material,
}

/// Keeps whichever of `nearest` and `candidate` is closer.
///
/// Ties go to the hit already held, so the first of several equally distant
/// surfaces wins.
pub fn keep_nearest<'a>(nearest: &mut Option<Hit<'a>>, candidate: Option<Hit<'a>>) {
    if let Some(hit) = candidate {
        match nearest {
            Some(best) if hit.t >= best.t => {},
            _ => *nearest = Some(hit),
        }
    }
}

#[test]
fn nearest_wins() {
    let m = Material::default();
    let at = |t: f64| Some(Hit {
        t,
        point: Vector3::zero(),
        normal: Vector3::new(0.0, 1.0, 0.0),
        uv: Vector2::default(),
        material: &m,
    });

    let mut nearest = None;
    keep_nearest(&mut nearest, None);
    assert!(nearest.is_none());

    keep_nearest(&mut nearest, at(5.0));
    keep_nearest(&mut nearest, at(3.0));
    keep_nearest(&mut nearest, at(4.0));
    assert_eq!(nearest.map(|h| h.t), Some(3.0));
}

#[test]
fn equal_distance_keeps_first() {
    let first = Material::default();
    let second = Material::default().with_phong(0.0, 0.0, 0.0, 1.0);
    let hit = |material| Some(Hit {
        t: 2.0,
        point: Vector3::zero(),
        normal: Vector3::new(0.0, 1.0, 0.0),
        uv: Vector2::default(),
        material,
    });

    let mut nearest = None;
    keep_nearest(&mut nearest, hit(&first));
    keep_nearest(&mut nearest, hit(&second));

    assert!(std::ptr::eq(nearest.unwrap().material, &first));
}
