use std::f64::consts::{ PI, FRAC_PI_2 };

use crate::interpolate;
use crate::color::Color;
use crate::texture::Texture;
use crate::vector::{ Vector2, Vector3 };
use crate::consts::{ BUMP_EPSILON, BUMP_SCALE };

/// What gives a material its base color.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialKind {
    Solid(Color),
    Textured(Texture),
}

/// A surface material.
///
/// Coefficients follow the Phong model, plus the Whitted terms for how much
/// of the final color comes from reflected and transmitted rays. Reflectance
/// and transmittance are independent; nothing keeps their sum at or below
/// one, and the shader blends them exactly as given.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,

    /// Ambient coefficient. Also the distance attenuation constant for
    /// lights reaching this surface.
    pub ka: f64,
    pub kd: f64,
    pub ks: f64,
    pub exponent: f64,

    pub reflectance: f64,
    pub transmittance: f64,
    pub refractive_index: f64,

    pub texture: Option<Texture>,
    pub bump_map: Option<Texture>,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),

            ka: 0.3,
            kd: 0.9,
            ks: 1.0,
            exponent: 200.0,

            reflectance: 0.8,
            transmittance: 0.0,
            refractive_index: 2.3,

            texture: None,
            bump_map: None,
        }
    }
}

impl Material {
    /// Creates a material with default coefficients.
    ///
    /// A textured material takes its color entirely from the texture, so its
    /// base color is white.
    pub fn new(kind: MaterialKind) -> Material {
        match kind {
            MaterialKind::Solid(color) => Material { color, ..Default::default() },
            MaterialKind::Textured(texture) => Material {
                texture: Some(texture),
                ..Default::default()
            },
        }
    }

    /// Sets the four Phong coefficients.
    pub fn with_phong(mut self, ka: f64, kd: f64, ks: f64, exponent: f64) -> Material {
        self.ka = ka;
        self.kd = kd;
        self.ks = ks;
        self.exponent = exponent;
        self
    }

    /// Sets reflectance, transmittance and refractive index.
    pub fn with_optics(mut self, reflectance: f64, transmittance: f64,
        refractive_index: f64) -> Material {
        self.reflectance = reflectance;
        self.transmittance = transmittance;
        self.refractive_index = refractive_index;
        self
    }

    pub fn with_bump_map(mut self, bump_map: Texture) -> Material {
        self.bump_map = Some(bump_map);
        self
    }

    /// The texture, if there is one that loaded.
    pub fn valid_texture(&self) -> Option<&Texture> {
        self.texture.as_ref().filter(|t| t.is_valid())
    }

    /// Tilts `normal` by the slope of the bump map at `uv`.
    ///
    /// The height gradient is taken by forward differences in `u` and `v`
    /// and added along the world X and Y axes, not a per-surface tangent
    /// frame. Without a usable bump map the normal is returned untouched.
    pub fn bump_normal(&self, normal: Vector3, uv: Vector2) -> Vector3 {
        let bump = match self.bump_map.as_ref().filter(|b| b.is_valid()) {
            Some(bump) => bump,
            None => return normal,
        };

        let height = |uv: Vector2| bump.sample(uv).luminance();
        let h = height(uv);
        let du = (height(uv + Vector2::new(BUMP_EPSILON, 0.0)) - h) / BUMP_EPSILON;
        let dv = (height(uv + Vector2::new(0.0, BUMP_EPSILON)) - h) / BUMP_EPSILON;

        let tangent = Vector3::new(1.0, 0.0, 0.0);
        let bitangent = Vector3::new(0.0, 1.0, 0.0);

        (normal + tangent * (du * BUMP_SCALE) + bitangent * (dv * BUMP_SCALE)).normalize()
    }
}

/// Spherical texture coordinates for a direction from a sphere's center.
///
/// Longitude from `atan2(z, x)` becomes `u`, latitude from `asin(y)` becomes
/// `v`, and both pass through `interpolate`.
pub fn spherical_uv(direction: Vector3) -> Vector2 {
    let d = direction.normalize();
    let u = (d.z.atan2(d.x) + PI) / (2.0 * PI);
    let v = (d.y.clamp(-1.0, 1.0).asin() + FRAC_PI_2) / PI;

    Vector2::new(interpolate(u), interpolate(v))
}

#[test]
fn default_material() {
    let m: Material = Default::default();

    assert_eq!(m.color, Color::white());
    assert_eq!(m.ka, 0.3);
    assert_eq!(m.kd, 0.9);
    assert_eq!(m.ks, 1.0);
    assert_eq!(m.exponent, 200.0);
    assert_eq!(m.reflectance, 0.8);
    assert_eq!(m.transmittance, 0.0);
    assert_eq!(m.refractive_index, 2.3);
    assert!(m.texture.is_none() && m.bump_map.is_none());
}

#[test]
fn material_kinds() {
    let solid = Material::new(MaterialKind::Solid(Color::rgb(1.0, 0.0, 0.0)));
    assert_eq!(solid.color, Color::rgb(1.0, 0.0, 0.0));
    assert!(solid.valid_texture().is_none());

    let tex = Texture::from_pixels(1, 1, vec![Color::rgb(0.0, 1.0, 0.0)]);
    let textured = Material::new(MaterialKind::Textured(tex));
    assert_eq!(textured.color, Color::white());
    assert!(textured.valid_texture().is_some());
}

#[test]
fn invalid_texture_is_ignored() {
    let m = Material::new(MaterialKind::Textured(Texture::default()));

    assert!(m.texture.is_some());
    assert!(m.valid_texture().is_none());
}

#[test]
fn flat_bump_map_keeps_normal() {
    let bump = Texture::from_pixels(2, 2, vec![Color::gray(0.5); 4]);
    let m = Material::default().with_bump_map(bump);
    let n = Vector3::new(0.0, 0.0, -1.0);

    assert_eq!(m.bump_normal(n, Vector2::new(0.3, 0.3)), n);
    assert_eq!(Material::default().bump_normal(n, Vector2::new(0.3, 0.3)), n);
}

#[test]
fn bump_ramp_tilts_normal() {
    // Height rises with u
    let pixels = (0..16).map(|i| Color::gray((i % 4) as f64 / 3.0)).collect();
    let bump = Texture::from_pixels(4, 4, pixels);
    let m = Material::default().with_bump_map(bump);

    // The gradient is added, so the normal leans toward +X
    let n = m.bump_normal(Vector3::new(0.0, 0.0, -1.0), Vector2::new(0.3, 0.5));
    assert!(n.x > 0.0);
    assert!(crate::feq(n.y, 0.0));
    assert!(crate::feq(n.length(), 1.0));
}

#[test]
fn spherical_uv_poles_and_seam() {
    // Straight up is the top of the map
    let top = spherical_uv(Vector3::new(0.0, 1.0, 0.0));
    assert!(crate::feq(top.v, 1.0));

    // +X lands mid-map, u = 0.5 before the remap
    let side = spherical_uv(Vector3::new(1.0, 0.0, 0.0));
    assert!(crate::feq(side.u, interpolate(0.5)));
    assert!(crate::feq(side.v, interpolate(0.5)));
}
