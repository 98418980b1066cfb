use crate::camera::Camera;
use crate::consts::TRIANGLE_T_MIN;
use crate::geometry::Sphere;
use crate::intersect::{ Hit, keep_nearest };
use crate::light::{ Light, Spotlight };
use crate::model::Model;
use crate::ray::Ray;

/// Everything that gets rendered: geometry, lights and the camera.
///
/// The scene owns all of it by value, and is only read while rendering.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub models: Vec<Model>,
    pub lights: Vec<Light>,
    pub spotlights: Vec<Spotlight>,
    pub camera: Camera,
}

impl Scene {
    pub fn new(camera: Camera) -> Scene {
        Scene { camera, ..Default::default() }
    }

    /// Finds the nearest surface along `ray`.
    ///
    /// Every sphere is tried, then every triangle of every model; there is no
    /// acceleration structure. Of several hits at the same distance the first
    /// one tried is kept.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let mut nearest = None;

        for sphere in self.spheres.iter() {
            keep_nearest(&mut nearest, sphere.intersect(ray));
        }

        for model in self.models.iter() {
            for triangle in model.triangles.iter() {
                keep_nearest(&mut nearest,
                    triangle.hit(ray, TRIANGLE_T_MIN, f64::MAX, &model.material));
            }
        }

        nearest
    }

    /// Whether anything at all lies along `ray`.
    ///
    /// Shadow rays aren't limited to the distance of the light, so geometry
    /// beyond a light still blocks it.
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.spheres.iter().any(|s| s.intersect(ray).is_some())
            || self.models.iter().any(|m| m.triangles.iter()
                .any(|t| t.intersect(ray, TRIANGLE_T_MIN, f64::MAX).is_some()))
    }

    /// Number of triangles across all models.
    pub fn triangle_count(&self) -> usize {
        self.models.iter().map(|m| m.triangles.len()).sum()
    }
}

#[cfg(test)]
fn two_spheres() -> Scene {
    use crate::color::Color;
    use crate::material::{ Material, MaterialKind };
    use crate::vector::Vector3;

    let mut scene = Scene::default();
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, 5.0), 1.0,
        Material::new(MaterialKind::Solid(Color::rgb(1.0, 0.0, 0.0)))));
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, 2.0), 0.5,
        Material::new(MaterialKind::Solid(Color::rgb(0.0, 1.0, 0.0)))));

    scene
}

#[test]
fn nearest_sphere_wins_regardless_of_order() {
    use crate::color::Color;
    use crate::vector::Vector3;

    let scene = two_spheres();
    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));
    let hit = scene.intersect(&ray).unwrap();

    assert!(crate::feq(hit.t, 1.5));
    assert_eq!(hit.material.color, Color::rgb(0.0, 1.0, 0.0));
}

#[test]
fn triangles_compete_with_spheres() {
    use crate::material::Material;
    use crate::vector::Vector3;

    let mut scene = two_spheres();
    let mesh = "v -1 -1 1\nv 1 -1 1\nv 0 1 1\nf 1 2 3\n";
    scene.models.push(Model::parse(mesh.as_bytes(), "wall".into(),
        Material::default().with_optics(0.0, 0.0, 1.0)).unwrap());

    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));
    let hit = scene.intersect(&ray).unwrap();

    assert!(crate::feq(hit.t, 1.0));
    assert_eq!(hit.material.reflectance, 0.0);
    assert_eq!(scene.triangle_count(), 1);
}

#[test]
fn empty_scene_has_no_hits() {
    use crate::vector::Vector3;

    let scene = Scene::default();
    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert!(scene.intersect(&ray).is_none());
    assert!(!scene.occluded(&ray));
}

#[test]
fn occlusion_is_unbounded() {
    use crate::vector::Vector3;

    let scene = two_spheres();

    assert!(scene.occluded(&Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0))));
    assert!(!scene.occluded(&Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0))));
}
