//! Loading scenes from JSON scene descriptions.

use std::fs;
use std::path::{ Path, PathBuf };

use log::{ info, warn };
use serde::{ Serialize, Deserialize };
use thiserror::Error;

use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::Sphere;
use crate::light::{ Light, Spotlight };
use crate::material::{ Material, MaterialKind };
use crate::matrix::Transform;
use crate::model::{ Model, ObjError };
use crate::scene::Scene;
use crate::texture::Texture;
use crate::vector::Vector3;

/// Errors that make a scene description unusable.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error reading {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mesh {path}: {source}")]
    Mesh { path: String, source: ObjError },

    #[error("Scene has no camera")]
    MissingCamera,

    #[error("Transform of surface {0} can't be inverted")]
    SingularTransform(usize),
}

/// The on-disk shape of a scene description.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SceneJson {
    #[serde(default)]
    surfaces: Vec<SurfaceJson>,

    #[serde(default)]
    lights: Vec<LightJson>,

    #[serde(default)]
    spotlights: Vec<SpotlightJson>,

    camera: Option<CameraJson>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SurfaceJson {
    Sphere {
        radius: f64,
        position: [f64; 3],

        material_solid: Option<MaterialJson>,
        material_textured: Option<MaterialJson>,

        #[serde(default)]
        transform: Vec<TransformOp>,
    },
    Mesh {
        name: String,

        material_solid: Option<MaterialJson>,
        material_textured: Option<MaterialJson>,

        #[serde(default)]
        transform: Vec<TransformOp>,
    },
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct MaterialJson {
    color: Option<[f64; 3]>,
    texture: Option<String>,
    bump: Option<String>,
    phong: Option<PhongJson>,

    #[serde(default)]
    reflectance: f64,

    #[serde(default)]
    transmittance: f64,

    #[serde(default = "default_refraction")]
    refraction: f64,
}

fn default_refraction() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Debug)]
struct PhongJson {
    ka: f64,
    kd: f64,
    ks: f64,
    exponent: f64,
}

/// One step of a transform list. Rotations are in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
enum TransformOp {
    Translate([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),
    Scale([f64; 3]),
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LightJson {
    Ambient { color: [f64; 3] },
    Point { color: [f64; 3], position: [f64; 3] },
}

#[derive(Serialize, Deserialize, Debug)]
struct SpotlightJson {
    position: [f64; 3],
    direction: [f64; 3],

    /// Half-angle of the cone, in degrees.
    angle: f64,

    color: [f64; 3],

    #[serde(default = "default_one")]
    intensity: f64,

    #[serde(default = "default_one")]
    falloff: f64,
}

fn default_one() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Debug)]
struct CameraJson {
    position: [f64; 3],
    lookat: [f64; 3],
    up: [f64; 3],

    /// Half of the horizontal field of view, in degrees.
    horizontal_fov: f64,

    resolution: [usize; 2],
    max_bounces: usize,

    /// When present, places the camera instead of position and lookat.
    transform: Option<Vec<TransformOp>>,

    aperture: Option<f64>,
    focus_distance: Option<f64>,
}

/// Folds a list of operations into one transform, in list order.
fn build_transform(ops: &[TransformOp]) -> Transform {
    ops.iter().fold(Transform::new(), |t, op| match *op {
        TransformOp::Translate(v) => t.translate(v.into()),
        TransformOp::RotateX(deg) => t.rotate_x(deg.to_radians()),
        TransformOp::RotateY(deg) => t.rotate_y(deg.to_radians()),
        TransformOp::RotateZ(deg) => t.rotate_z(deg.to_radians()),
        TransformOp::Scale(v) => t.scale(v.into()),
    })
}

impl From<&CameraJson> for Camera {
    fn from(json: &CameraJson) -> Camera {
        let mut camera = Camera::new(
            json.position.into(),
            json.lookat.into(),
            json.up.into(),
            json.horizontal_fov.to_radians(),
            json.resolution[0],
            json.resolution[1],
        );
        camera.max_bounce = json.max_bounces;

        if let Some(ops) = json.transform.as_ref() {
            camera.transform = build_transform(ops);
            camera.use_transform = true;
        }

        if let Some(aperture) = json.aperture {
            camera.enable_depth_of_field(Some(aperture), json.focus_distance);
        }

        camera
    }
}

impl From<&SpotlightJson> for Spotlight {
    fn from(json: &SpotlightJson) -> Spotlight {
        Spotlight {
            position: json.position.into(),
            direction: Vector3::from(json.direction).normalize(),
            angle: json.angle.to_radians(),
            color: json.color.into(),
            intensity: json.intensity,
            falloff_exponent: json.falloff,
        }
    }
}

impl From<&LightJson> for Light {
    fn from(json: &LightJson) -> Light {
        match json {
            LightJson::Ambient { color } => Light::ambient((*color).into()),
            LightJson::Point { color, position } => {
                Light::point((*position).into(), (*color).into())
            },
        }
    }
}

/// Turns descriptions into scene objects, resolving file names against a
/// base directory.
struct Loader {
    base_dir: PathBuf,
}

impl Loader {
    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Builds the material a surface asks for, or `None` if it names none.
    /// A solid material wins if both keys are given.
    fn material(&self, solid: Option<&MaterialJson>, textured: Option<&MaterialJson>)
        -> Option<Material> {
        let (json, kind) = if let Some(json) = solid {
            let color = json.color.map(Color::from).unwrap_or_else(Color::white);
            (json, MaterialKind::Solid(color))
        } else {
            let json = textured?;
            let texture = match json.texture.as_deref() {
                Some(name) => Texture::load(self.resolve(name)),
                None => {
                    warn!("Textured material without a texture file");
                    Texture::default()
                }
            };
            (json, MaterialKind::Textured(texture))
        };

        let mut material = Material::new(kind)
            .with_optics(json.reflectance, json.transmittance, json.refraction);

        if let Some(p) = json.phong.as_ref() {
            material = material.with_phong(p.ka, p.kd, p.ks, p.exponent);
        }

        if let Some(name) = json.bump.as_deref() {
            material = material.with_bump_map(Texture::load(self.resolve(name)));
        }

        Some(material)
    }

    fn add_surface(&self, scene: &mut Scene, index: usize, surface: &SurfaceJson)
        -> Result<(), SceneError> {
        match surface {
            SurfaceJson::Sphere {
                radius, position, material_solid, material_textured, transform
            } => {
                let material = match self.material(material_solid.as_ref(),
                    material_textured.as_ref()) {
                    Some(m) => m,
                    None => {
                        warn!("Skipping sphere {}: no material_solid or material_textured", index);
                        return Ok(());
                    }
                };

                let sphere = Sphere::new((*position).into(), *radius, material)
                    .transformed(build_transform(transform))
                    .ok_or(SceneError::SingularTransform(index))?;
                scene.spheres.push(sphere);
            },
            SurfaceJson::Mesh { name, material_solid, material_textured, transform } => {
                let material = match self.material(material_solid.as_ref(),
                    material_textured.as_ref()) {
                    Some(m) => m,
                    None => {
                        warn!("Skipping mesh {}: no material_solid or material_textured", name);
                        return Ok(());
                    }
                };

                let path = self.resolve(name);
                let mut model = Model::load(&path, material).map_err(|source| SceneError::Mesh {
                    path: path.display().to_string(),
                    source,
                })?;

                if !transform.is_empty() {
                    model.apply_transform(&build_transform(transform));
                }
                scene.models.push(model);
            },
        }

        Ok(())
    }

    fn build(&self, json: &SceneJson) -> Result<Scene, SceneError> {
        let camera = json.camera.as_ref().ok_or(SceneError::MissingCamera)?;
        let mut scene = Scene::new(camera.into());

        for (index, surface) in json.surfaces.iter().enumerate() {
            self.add_surface(&mut scene, index, surface)?;
        }

        scene.lights = json.lights.iter().map(Light::from).collect();
        scene.spotlights = json.spotlights.iter().map(Spotlight::from).collect();

        Ok(scene)
    }
}

/// Parses a scene description held in memory. Relative mesh and texture
/// paths are looked up under `base_dir`.
pub fn from_str<P: AsRef<Path>>(json: &str, base_dir: P) -> Result<Scene, SceneError> {
    let description: SceneJson = serde_json::from_str(json)?;
    let loader = Loader { base_dir: base_dir.as_ref().to_path_buf() };

    loader.build(&description)
}

/// Reads and builds the scene described by the file at `path`.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let scene = from_str(&text, base_dir)?;

    info!("Loaded scene {}: {} spheres, {} meshes ({} triangles), {} lights, {} spotlights",
        path.display(), scene.spheres.len(), scene.models.len(), scene.triangle_count(),
        scene.lights.len(), scene.spotlights.len());

    Ok(scene)
}

#[cfg(test)]
const ONE_SPHERE: &str = r#"{
    "surfaces": [
        { "type": "sphere", "radius": 1.5, "position": [0, 0, 4],
          "material_solid": {
              "color": [1, 0, 0],
              "phong": { "ka": 0.2, "kd": 0.7, "ks": 0.5, "exponent": 32 },
              "reflectance": 0.25, "transmittance": 0.5, "refraction": 1.5
          } }
    ],
    "lights": [
        { "type": "ambient", "color": [0.1, 0.1, 0.1] },
        { "type": "point", "color": [1, 1, 1], "position": [0, 5, 0] }
    ],
    "camera": {
        "position": [0, 0, -5], "lookat": [0, 0, 0], "up": [0, 1, 0],
        "horizontal_fov": 45, "resolution": [320, 240], "max_bounces": 3
    }
}"#;

#[test]
fn parses_sphere_lights_and_camera() {
    let scene = from_str(ONE_SPHERE, ".").unwrap();

    assert_eq!(scene.spheres.len(), 1);
    let sphere = &scene.spheres[0];
    assert_eq!(sphere.center, Vector3::new(0.0, 0.0, 4.0));
    assert_eq!(sphere.radius, 1.5);
    assert_eq!(sphere.material.color, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(sphere.material.kd, 0.7);
    assert_eq!(sphere.material.exponent, 32.0);
    assert_eq!(sphere.material.transmittance, 0.5);
    assert_eq!(sphere.material.refractive_index, 1.5);

    assert_eq!(scene.lights, vec![
        Light::ambient(Color::gray(0.1)),
        Light::point(Vector3::new(0.0, 5.0, 0.0), Color::white()),
    ]);

    let camera = &scene.camera;
    assert_eq!((camera.width, camera.height), (320, 240));
    assert_eq!(camera.max_bounce, 3);
    assert!(crate::feq(camera.fov, std::f64::consts::FRAC_PI_4));
    assert!(!camera.use_transform);
    assert!(camera.depth_of_field.is_none());
}

#[test]
fn missing_camera_is_fatal() {
    let err = from_str(r#"{ "surfaces": [] }"#, ".").unwrap_err();

    assert!(matches!(err, SceneError::MissingCamera));
}

#[test]
fn malformed_json_is_fatal() {
    let err = from_str("{ \"surfaces\": [ ", ".").unwrap_err();

    assert!(matches!(err, SceneError::Json(_)));
}

#[test]
fn surface_without_material_is_skipped() {
    let json = r#"{
        "surfaces": [ { "type": "sphere", "radius": 1, "position": [0, 0, 0] } ],
        "camera": { "position": [0, 0, -5], "lookat": [0, 0, 0], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [4, 4], "max_bounces": 1 }
    }"#;
    let scene = from_str(json, ".").unwrap();

    assert!(scene.spheres.is_empty());
}

#[test]
fn sphere_transform_in_list_order() {
    let json = r#"{
        "surfaces": [
            { "type": "sphere", "radius": 1, "position": [0, 0, 0],
              "material_solid": { "color": [1, 1, 1] },
              "transform": [ { "translate": [0, 0, 10] }, { "scale": [2, 2, 2] } ] }
        ],
        "camera": { "position": [0, 0, 0], "lookat": [0, 0, 1], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [4, 4], "max_bounces": 1 }
    }"#;
    let scene = from_str(json, ".").unwrap();
    let ray = crate::ray::Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));
    let hit = scene.intersect(&ray).unwrap();

    // Scaled to radius 2, then moved out to z = 10
    assert!(crate::feq(hit.t, 8.0));
}

#[test]
fn singular_transform_is_rejected() {
    let json = r#"{
        "surfaces": [
            { "type": "sphere", "radius": 1, "position": [0, 0, 0],
              "material_solid": { "color": [1, 1, 1] },
              "transform": [ { "scale": [0, 1, 1] } ] }
        ],
        "camera": { "position": [0, 0, 0], "lookat": [0, 0, 1], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [4, 4], "max_bounces": 1 }
    }"#;

    assert!(matches!(from_str(json, ".").unwrap_err(), SceneError::SingularTransform(0)));
}

#[test]
fn missing_mesh_is_fatal() {
    let json = r#"{
        "surfaces": [
            { "type": "mesh", "name": "no_such_mesh.obj",
              "material_solid": { "color": [1, 1, 1] } }
        ],
        "camera": { "position": [0, 0, 0], "lookat": [0, 0, 1], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [4, 4], "max_bounces": 1 }
    }"#;

    assert!(matches!(from_str(json, "/nonexistent").unwrap_err(), SceneError::Mesh { .. }));
}

#[test]
fn textured_material_with_missing_file_degrades() {
    let json = r#"{
        "surfaces": [
            { "type": "sphere", "radius": 1, "position": [0, 0, 0],
              "material_textured": { "texture": "missing.png" } }
        ],
        "camera": { "position": [0, 0, 0], "lookat": [0, 0, 1], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [4, 4], "max_bounces": 1 }
    }"#;
    let scene = from_str(json, "/nonexistent").unwrap();
    let material = &scene.spheres[0].material;

    assert!(material.texture.is_some());
    assert!(material.valid_texture().is_none());
    assert_eq!(material.color, Color::white());
}

#[test]
fn camera_transform_and_lens() {
    let json = r#"{
        "spotlights": [
            { "position": [0, 5, 0], "direction": [0, -2, 0], "angle": 30,
              "color": [1, 1, 1], "intensity": 2 }
        ],
        "camera": { "position": [0, 0, -5], "lookat": [0, 0, 0], "up": [0, 1, 0],
                    "horizontal_fov": 30, "resolution": [8, 8], "max_bounces": 2,
                    "transform": [ { "translate": [0, 1, 0] }, { "rotate_y": 180 } ],
                    "aperture": 0.1 }
    }"#;
    let scene = from_str(json, ".").unwrap();
    let camera = &scene.camera;

    assert!(camera.use_transform);
    assert_eq!(camera.transform.transform_point(Vector3::zero()), Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(camera.depth_of_field, Some(crate::camera::DepthOfField { aperture: 0.1, focus_distance: 5.0 }));

    let spot = &scene.spotlights[0];
    assert_eq!(spot.direction, Vector3::new(0.0, -1.0, 0.0));
    assert!(crate::feq(spot.angle, std::f64::consts::PI / 6.0));
    assert_eq!(spot.intensity, 2.0);
    assert_eq!(spot.falloff_exponent, 1.0);
}

#[test]
fn transform_ops_fold_in_order() {
    let ops = [TransformOp::Translate([1.0, 0.0, 0.0]), TransformOp::RotateZ(90.0)];
    let p = build_transform(&ops).transform_point(Vector3::new(1.0, 0.0, 0.0));

    assert_eq!(p, Vector3::new(1.0, 1.0, 0.0));
}
