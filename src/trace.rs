//! The recursive Whitted shader.

use crate::camera::Camera;
use crate::color::Color;
use crate::consts::{ BIAS_EPSILON, TEXTURE_SAMPLES };
use crate::intersect::Hit;
use crate::light::{ Light, attenuation, phong };
use crate::ray::Ray;
use crate::scene::Scene;
use crate::vector::Vector3;

/// Shades `ray`, following reflected and refracted rays until
/// `camera.max_bounce` is passed.
///
/// A ray past the recursion limit, or one that hits nothing, is black.
/// Otherwise the color is built up in this order:
///
/// 1. the material's ambient term, `color * ka`
/// 2. diffuse and specular from every unshadowed point light
/// 3. the reflection/refraction blend,
///    `local * (1 - r - t) + reflected * r + refracted * t`
/// 4. diffuse and specular from every unshadowed spotlight, faded toward
///    the cone's rim; spotlights see the geometric normal, not the bumped
///    one
/// 5. a component-wise tint by the material's texture, if it has one
pub fn ray_trace(ray: &Ray, scene: &Scene, camera: &Camera, depth: usize) -> Color {
    if depth > camera.max_bounce {
        return Color::black();
    }

    let hit = match scene.intersect(ray) {
        Some(hit) => hit,
        None => return Color::black(),
    };

    let m = hit.material;
    let view_dir = (camera.position - hit.point).normalize();
    let shading_normal = m.bump_normal(hit.normal, hit.uv);

    let mut color = m.color * m.ka;
    for light in scene.lights.iter() {
        if let Light::Point { position, intensity } = *light {
            let to_light = position - hit.point;
            if in_shadow(scene, &hit, to_light) {
                continue;
            }

            let local = phong(m, shading_normal, to_light.normalize(), view_dir);
            color = color + local * intensity * attenuation(m, to_light.length());
        }
    }

    color = blend_secondary(ray, scene, camera, depth, &hit, color);

    for spot in scene.spotlights.iter() {
        let falloff = match spot.falloff(hit.point) {
            Some(f) => f,
            None => continue,
        };

        let to_light = spot.position - hit.point;
        if in_shadow(scene, &hit, to_light) {
            continue;
        }

        let local = phong(m, hit.normal, to_light.normalize(), view_dir) * spot.color;
        color = color + local * (spot.intensity * falloff * attenuation(m, to_light.length()));
    }

    if let Some(texture) = m.valid_texture() {
        color = color * texture.sample_super(hit.uv, TEXTURE_SAMPLES);
    }

    color
}

/// Whether anything blocks the path from the hit toward a light.
fn in_shadow(scene: &Scene, hit: &Hit, to_light: Vector3) -> bool {
    scene.occluded(&Ray::offset(hit.point, to_light, BIAS_EPSILON))
}

/// Mixes `local` with the reflected and transmitted colors.
///
/// A coefficient of zero contributes nothing, so its ray isn't traced. A
/// refraction past the critical angle has no transmitted ray and counts as
/// black.
fn blend_secondary(ray: &Ray, scene: &Scene, camera: &Camera, depth: usize,
    hit: &Hit, local: Color) -> Color {
    let m = hit.material;
    if m.reflectance == 0.0 && m.transmittance == 0.0 {
        return local;
    }

    let reflected = if m.reflectance != 0.0 {
        let dir = ray.direction.reflect(&hit.normal);
        ray_trace(&Ray::offset(hit.point, dir, BIAS_EPSILON), scene, camera, depth + 1)
    } else {
        Color::black()
    };

    let refracted = if m.transmittance != 0.0 {
        let dir = ray.direction.refract(&hit.normal, m.refractive_index);
        if dir.is_zero() {
            Color::black()
        } else {
            ray_trace(&Ray::offset(hit.point, dir, BIAS_EPSILON), scene, camera, depth + 1)
        }
    } else {
        Color::black()
    };

    local * (1.0 - m.reflectance - m.transmittance)
        + reflected * m.reflectance
        + refracted * m.transmittance
}

#[cfg(test)]
mod fixtures {
    use crate::camera::Camera;
    use crate::color::Color;
    use crate::geometry::Sphere;
    use crate::light::Light;
    use crate::material::{ Material, MaterialKind };
    use crate::scene::Scene;
    use crate::vector::Vector3;

    pub fn camera() -> Camera {
        let mut c = Camera::new(
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::zero(),
            Vector3::new(0.0, 1.0, 0.0),
            std::f64::consts::FRAC_PI_4,
            2,
            2,
        );
        c.max_bounce = 0;
        c
    }

    pub fn matte(color: Color) -> Material {
        Material::new(MaterialKind::Solid(color)).with_optics(0.0, 0.0, 1.0)
    }

    /// A unit sphere at the origin lit from the camera's side.
    pub fn lit_sphere() -> Scene {
        let mut scene = Scene::new(camera());
        scene.spheres.push(Sphere::new(Vector3::zero(), 1.0, matte(Color::rgb(1.0, 0.5, 0.25))));
        scene.lights.push(Light::point(Vector3::new(0.0, 0.0, -10.0), Color::white()));
        scene
    }
}

#[test]
fn miss_is_black() {
    let scene = fixtures::lit_sphere();
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 1.0, 0.0));

    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), Color::black());
}

#[test]
fn front_lit_sphere() {
    let scene = fixtures::lit_sphere();
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    // Ambient 0.3, then (0.9 diffuse + 1.0 specular) attenuated over 9 units
    let m = &scene.spheres[0].material;
    let att = 1.0 / (1.0 + 0.3 * 9.0);
    let expected = m.color * 0.3 + (m.color * 0.9 + Color::white()) * att;

    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), expected);
}

#[test]
fn ambient_lights_are_skipped() {
    let mut scene = fixtures::lit_sphere();
    scene.lights = vec![Light::ambient(Color::white())];
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    let m = &scene.spheres[0].material;
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), m.color * m.ka);
}

#[test]
fn zero_coefficients_without_light_is_black() {
    use crate::geometry::Sphere;

    let mut scene = Scene::new(fixtures::camera());
    scene.spheres.push(Sphere::new(Vector3::zero(), 1.0,
        fixtures::matte(Color::white()).with_phong(0.0, 0.0, 0.0, 200.0)));
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), Color::black());
}

#[test]
fn past_max_bounce_is_black() {
    let mut scene = fixtures::lit_sphere();
    scene.spheres[0].material = scene.spheres[0].material.clone().with_optics(1.0, 0.0, 1.0);
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let camera = scene.camera.clone();

    assert_eq!(ray_trace(&ray, &scene, &camera, camera.max_bounce + 1), Color::black());
}

#[test]
fn full_mirror_at_last_bounce_is_black() {
    let mut scene = fixtures::lit_sphere();
    scene.spheres[0].material = scene.spheres[0].material.clone().with_optics(1.0, 0.0, 1.0);
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    // The local color is weighted by zero and the reflected ray is past the
    // limit
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, scene.camera.max_bounce), Color::black());
}

#[test]
fn occluder_removes_direct_light() {
    use crate::geometry::Sphere;

    let mut scene = fixtures::lit_sphere();
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let m = scene.spheres[0].material.clone();

    // Small blocker between the light and the lit point, off the camera ray
    scene.lights = vec![Light::point(Vector3::new(0.0, 10.0, -10.0), Color::white())];
    let lit = ray_trace(&ray, &scene, &scene.camera, 0);
    assert!(lit.r > (m.color * m.ka).r);

    scene.spheres.push(Sphere::new(Vector3::new(0.0, 5.0, -5.5), 0.5, fixtures::matte(Color::white())));
    let shadowed = ray_trace(&ray, &scene, &scene.camera, 0);
    assert_eq!(shadowed, m.color * m.ka);
}

#[test]
fn mirror_picks_up_what_it_faces() {
    use crate::geometry::Sphere;
    use crate::material::{ Material, MaterialKind };

    let mut scene = fixtures::lit_sphere();
    scene.camera.max_bounce = 1;
    scene.lights.clear();

    // Half-mirror in front, a bright ambient-only ball behind the camera
    scene.spheres[0].material = Material::new(MaterialKind::Solid(Color::black()))
        .with_phong(0.0, 0.0, 0.0, 1.0)
        .with_optics(0.5, 0.0, 1.0);
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -20.0), 2.0,
        fixtures::matte(Color::white()).with_phong(1.0, 0.0, 0.0, 1.0)));

    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), Color::gray(0.5));
}

#[test]
fn total_internal_reflection_transmits_black() {
    use crate::geometry::Sphere;
    use crate::material::{ Material, MaterialKind };

    let mut scene = Scene::new(fixtures::camera());
    scene.camera.max_bounce = 3;
    scene.spheres.push(Sphere::new(Vector3::zero(), 1.0,
        Material::new(MaterialKind::Solid(Color::white()))
            .with_phong(0.0, 0.0, 0.0, 1.0)
            .with_optics(0.0, 1.0, 1.5)));

    // From inside the sphere at a grazing angle to the surface
    let ray = Ray::new(Vector3::new(0.0, 0.9, 0.0), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), Color::black());
}

#[test]
fn spotlight_lights_only_inside_cone() {
    use crate::light::Spotlight;

    let mut scene = fixtures::lit_sphere();
    scene.lights.clear();
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let ambient = ray_trace(&ray, &scene, &scene.camera, 0);

    let spot = Spotlight {
        position: Vector3::new(0.0, 0.0, -10.0),
        direction: Vector3::new(0.0, 0.0, 1.0),
        angle: 0.2,
        color: Color::white(),
        intensity: 1.0,
        falloff_exponent: 1.0,
    };
    scene.spotlights.push(spot);
    assert!(ray_trace(&ray, &scene, &scene.camera, 0).r > ambient.r);

    scene.spotlights[0].direction = Vector3::new(0.0, 1.0, 0.0);
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), ambient);
}

#[test]
fn texture_tints_result() {
    use crate::texture::Texture;

    let mut scene = fixtures::lit_sphere();
    scene.lights.clear();
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let plain = ray_trace(&ray, &scene, &scene.camera, 0);

    let tint = Color::rgb(0.5, 1.0, 0.0);
    scene.spheres[0].material.texture = Some(Texture::from_pixels(2, 2, vec![tint; 4]));

    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), plain * tint);
}

#[test]
fn occluder_blocks_spotlight() {
    use crate::geometry::Sphere;
    use crate::light::Spotlight;

    let mut scene = fixtures::lit_sphere();
    scene.lights.clear();
    scene.spotlights.push(Spotlight {
        position: Vector3::new(0.0, 0.0, -10.0),
        direction: Vector3::new(0.0, 0.0, 1.0),
        angle: 0.2,
        color: Color::white(),
        intensity: 1.0,
        falloff_exponent: 1.0,
    });
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let m = scene.spheres[0].material.clone();
    assert!(ray_trace(&ray, &scene, &scene.camera, 0).r > (m.color * m.ka).r);

    // Behind the camera, so only the shadow ray runs into it
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -7.0), 0.5, fixtures::matte(Color::white())));
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), m.color * m.ka);
}

#[test]
fn oversaturated_blend_is_not_renormalized() {
    use crate::geometry::Sphere;
    use crate::material::{ Material, MaterialKind };
    use crate::model::Model;

    let mut scene = Scene::new(fixtures::camera());
    scene.camera.max_bounce = 1;

    // A wall facing +z whose reflectance and transmittance sum to 1.3, a red
    // ball behind the camera and a green one behind the wall
    let wall = Material::new(MaterialKind::Solid(Color::white())).with_optics(0.8, 0.5, 1.0);
    let obj = "v -10 -10 0\nv 10 -10 0\nv 0 10 0\nf 1 2 3\n";
    scene.models.push(Model::parse(obj.as_bytes(), "wall".into(), wall).unwrap());
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -20.0), 2.0,
        fixtures::matte(Color::rgb(1.0, 0.0, 0.0)).with_phong(1.0, 0.0, 0.0, 1.0)));
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, 20.0), 2.0,
        fixtures::matte(Color::rgb(0.0, 1.0, 0.0)).with_phong(1.0, 0.0, 0.0, 1.0)));

    // Ambient 0.3 weighted by 1 - 1.3, plus red * 0.8 and green * 0.5
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), Color::rgb(0.71, 0.41, -0.09));
}

#[test]
fn spotlight_ignores_bump_map() {
    use crate::light::Spotlight;
    use crate::texture::Texture;

    let mut scene = fixtures::lit_sphere();
    scene.lights.clear();
    scene.spotlights.push(Spotlight {
        position: Vector3::new(0.0, 0.0, -10.0),
        direction: Vector3::new(0.0, 0.0, 1.0),
        angle: 0.2,
        color: Color::white(),
        intensity: 1.0,
        falloff_exponent: 1.0,
    });
    let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let smooth = ray_trace(&ray, &scene, &scene.camera, 0);

    let ramp = (0..16).map(|i| Color::gray((i % 4) as f64 / 3.0)).collect();
    scene.spheres[0].material.bump_map = Some(Texture::from_pixels(4, 4, ramp));

    assert_eq!(ray_trace(&ray, &scene, &scene.camera, 0), smooth);
}
