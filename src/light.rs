use crate::clamp;
use crate::color::Color;
use crate::material::Material;
use crate::vector::Vector3;

/// An ambient or point light.
///
/// Ambient lights are kept for completeness of the scene description; the
/// shader applies a single ambient term from the material and skips them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    Ambient { intensity: Color },
    Point { position: Vector3, intensity: Color },
}

impl Light {
    pub fn ambient(intensity: Color) -> Light {
        Light::Ambient { intensity }
    }

    pub fn point(position: Vector3, intensity: Color) -> Light {
        Light::Point { position, intensity }
    }
}

/// A cone-shaped light.
///
/// `angle` is the half-angle of the cone in radians. Points inside the cone
/// are lit with a falloff that reaches zero at the rim; the exponent shapes
/// how fast it drops.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spotlight {
    pub position: Vector3,
    pub direction: Vector3,
    pub angle: f64,
    pub color: Color,
    pub intensity: f64,
    pub falloff_exponent: f64,
}

impl Spotlight {
    /// Angle between the spot axis and the line from the light to `point`.
    pub fn angle_to(&self, point: Vector3) -> f64 {
        let to_point = (point - self.position).normalize();
        let cos = to_point.dot(&self.direction.normalize());

        cos.clamp(-1.0, 1.0).acos()
    }

    /// The falloff at `point`, or `None` when it lies outside the cone.
    pub fn falloff(&self, point: Vector3) -> Option<f64> {
        let angle = self.angle_to(point);
        if angle > self.angle {
            return None;
        }

        Some(clamp(1.0 - angle / self.angle, 0.0, 1.0).powf(self.falloff_exponent))
    }
}

/// Distance attenuation `1 / (1 + ka * distance)`.
///
/// The material's ambient coefficient doubles as the attenuation constant.
pub fn attenuation(material: &Material, distance: f64) -> f64 {
    1.0 / (1.0 + material.ka * distance)
}

/// Diffuse plus specular Phong terms for one light direction.
///
/// `light_dir` points from the surface to the light, `view_dir` from the
/// surface to the eye; both unit length. The specular highlight is white.
pub fn phong(material: &Material, normal: Vector3, light_dir: Vector3,
    view_dir: Vector3) -> Color {
    let diffuse = material.color * material.kd * normal.dot(&light_dir).max(0.0);

    let reflect_dir = (-light_dir).reflect(&normal);
    let specular = material.ks * reflect_dir.dot(&view_dir).max(0.0).powf(material.exponent);

    diffuse + Color::gray(specular)
}

#[test]
fn phong_light_behind_surface() {
    let m = Material::default();
    let n = Vector3::new(0.0, 0.0, -1.0);
    let l = Vector3::new(0.0, 0.0, 1.0);
    let v = Vector3::new(0.0, 0.0, -1.0);

    assert_eq!(phong(&m, n, l, v), Color::black());
}

#[test]
fn phong_eye_and_light_on_normal() {
    let m = Material::default();
    let n = Vector3::new(0.0, 0.0, -1.0);

    // Full diffuse, full specular
    assert_eq!(phong(&m, n, n, n), Color::gray(0.9 + 1.0));
}

#[test]
fn phong_zero_coefficients_is_black() {
    let m = Material::default().with_phong(0.0, 0.0, 0.0, 200.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(phong(&m, n, n, n), Color::black());
}

#[test]
fn attenuation_uses_ambient() {
    let m = Material::default().with_phong(0.5, 0.9, 1.0, 200.0);

    assert_eq!(attenuation(&m, 2.0), 0.5);
    assert_eq!(attenuation(&m, 0.0), 1.0);
}

#[test]
fn spotlight_cone() {
    let spot = Spotlight {
        position: Vector3::new(0.0, 5.0, 0.0),
        direction: Vector3::new(0.0, -1.0, 0.0),
        angle: std::f64::consts::FRAC_PI_4,
        color: Color::white(),
        intensity: 1.0,
        falloff_exponent: 1.0,
    };

    // Dead center of the cone
    assert_eq!(spot.falloff(Vector3::zero()), Some(1.0));

    // Halfway to the rim
    let p = Vector3::new(5.0 * (std::f64::consts::PI / 8.0).tan(), 0.0, 0.0);
    assert!(crate::feq(spot.falloff(p).unwrap(), 0.5));

    // Outside
    assert_eq!(spot.falloff(Vector3::new(10.0, 0.0, 0.0)), None);
}
