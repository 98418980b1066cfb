use std::fs::File;
use std::io::{ self, BufRead, BufReader };
use std::path::Path;

use log::{ debug, info };
use thiserror::Error;

use crate::geometry::Triangle;
use crate::material::Material;
use crate::matrix::Transform;
use crate::vector::{ Vector2, Vector3 };

/// Errors raised while reading an OBJ mesh.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: malformed `{record}` record")]
    Malformed { line: usize, record: &'static str },

    #[error("line {line}: {pool} index {index} does not refer to an earlier record")]
    BadIndex { line: usize, pool: &'static str, index: usize },
}

/// One corner of a face: 1-based indices into the vertex, texcoord and
/// normal pools, as written in the file.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceVertex {
    pub vertex: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

/// A triangle mesh sharing one material.
///
/// The model owns its vertex, texcoord and normal pools and the triangles
/// built from them. Faces are resolved in file order; an index may only
/// point back at records that came before it.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub name: String,
    pub material: Material,

    pub vertices: Vec<Vector3>,
    pub texcoords: Vec<Vector2>,
    pub normals: Vec<Vector3>,
    pub faces: Vec<[FaceVertex; 3]>,
    pub triangles: Vec<Triangle>,

    /// Lines skipped because their record type isn't used.
    pub ignored_lines: usize,
}

impl Model {
    /// Reads an OBJ file from disk.
    pub fn load<P: AsRef<Path>>(path: P, material: Material) -> Result<Model, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let model = Model::parse(BufReader::new(file), path.display().to_string(), material)?;

        info!("Loaded mesh {}: {} vertices, {} triangles",
            model.name, model.vertices.len(), model.triangles.len());

        Ok(model)
    }

    /// Reads OBJ records from any buffered reader.
    ///
    /// Supports `v`, `vt`, `vn` and `f`. Faces with more than three corners
    /// are split into a triangle fan around the first corner. Anything else
    /// is counted in `ignored_lines`.
    pub fn parse<R: BufRead>(reader: R, name: String, material: Material)
        -> Result<Model, ObjError> {
        let mut model = Model {
            name,
            material,
            vertices: Vec::new(),
            texcoords: Vec::new(),
            normals: Vec::new(),
            faces: Vec::new(),
            triangles: Vec::new(),
            ignored_lines: 0,
        };

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            model.parse_line(i + 1, line.trim())?;
        }

        model.rebuild_triangles();
        Ok(model)
    }

    fn parse_line(&mut self, line: usize, text: &str) -> Result<(), ObjError> {
        let mut fields = text.split_whitespace();
        let record = match fields.next() {
            Some(r) if !r.starts_with('#') => r,
            _ => return Ok(()),
        };
        let args: Vec<&str> = fields.collect();

        match record {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&args, line, "v")?;
                self.vertices.push(Vector3::new(x, y, z));
            },
            "vt" => {
                let [u, v] = parse_floats::<2>(&args, line, "vt")?;
                self.texcoords.push(Vector2::new(u, v));
            },
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&args, line, "vn")?;
                self.normals.push(Vector3::new(x, y, z));
            },
            "f" => {
                if args.len() < 3 {
                    return Err(ObjError::Malformed { line, record: "f" });
                }

                let corners = args.iter()
                    .map(|a| self.parse_corner(a, line))
                    .collect::<Result<Vec<_>, _>>()?;

                for i in 1..(corners.len() - 1) {
                    self.faces.push([corners[0], corners[i], corners[i + 1]]);
                }
            },
            _ => {
                debug!("{}: ignoring `{}` record", line, record);
                self.ignored_lines += 1;
            },
        }

        Ok(())
    }

    /// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`, checking every index
    /// against the records seen so far.
    fn parse_corner(&self, corner: &str, line: usize) -> Result<FaceVertex, ObjError> {
        let malformed = ObjError::Malformed { line, record: "f" };
        let mut parts = corner.split('/');

        let mut index = |pool: &'static str, len: usize, required: bool|
            -> Result<Option<usize>, ObjError> {
            match parts.next() {
                Some("") | None if !required => Ok(None),
                Some(s) => {
                    let i: usize = s.parse()
                        .map_err(|_| ObjError::Malformed { line, record: "f" })?;
                    if i == 0 || i > len {
                        return Err(ObjError::BadIndex { line, pool, index: i });
                    }
                    Ok(Some(i))
                },
                None => Err(ObjError::Malformed { line, record: "f" }),
            }
        };

        let vertex = index("vertex", self.vertices.len(), true)?.ok_or(malformed)?;
        let texcoord = index("texcoord", self.texcoords.len(), false)?;
        let normal = index("normal", self.normals.len(), false)?;

        Ok(FaceVertex { vertex, texcoord, normal })
    }

    /// Rebuilds the triangle list from the faces and the current pools.
    fn rebuild_triangles(&mut self) {
        self.triangles = self.faces.iter()
            .map(|face| {
                let vertex = |c: &FaceVertex| self.vertices[c.vertex - 1];
                let mut tri = Triangle::new([vertex(&face[0]), vertex(&face[1]), vertex(&face[2])]);

                if let [Some(a), Some(b), Some(c)] = face.map(|c| c.normal) {
                    tri = tri.with_normals([
                        self.normals[a - 1].normalize(),
                        self.normals[b - 1].normalize(),
                        self.normals[c - 1].normalize(),
                    ]);
                }

                if let [Some(a), Some(b), Some(c)] = face.map(|c| c.texcoord) {
                    tri = tri.with_texcoords([
                        self.texcoords[a - 1],
                        self.texcoords[b - 1],
                        self.texcoords[c - 1],
                    ]);
                }

                tri
            })
            .collect();
    }

    /// Bakes `transform` into the vertex and normal pools.
    pub fn apply_transform(&mut self, transform: &Transform) {
        if transform.is_identity() {
            return;
        }

        let normal_matrix = transform.matrix.inverse()
            .unwrap_or(transform.matrix)
            .transposition();

        for v in self.vertices.iter_mut() {
            *v = transform.transform_point(*v);
        }
        for n in self.normals.iter_mut() {
            *n = normal_matrix.transform_vector(*n).normalize();
        }

        self.rebuild_triangles();
    }
}

fn parse_floats<const N: usize>(args: &[&str], line: usize, record: &'static str)
    -> Result<[f64; N], ObjError> {
    let mut out = [0.0; N];
    if args.len() < N {
        return Err(ObjError::Malformed { line, record });
    }

    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| ObjError::Malformed { line, record })?;
    }

    Ok(out)
}

#[cfg(test)]
fn parse_str(obj: &str) -> Result<Model, ObjError> {
    Model::parse(obj.as_bytes(), "test.obj".into(), Material::default())
}

#[test]
fn ignoring_unrecognized_lines() {
    let model = parse_str("\
There was a young lady named Bright
who traveled much faster than light.
o Thing
g Group

# a comment
s off
").unwrap();

    assert_eq!(model.ignored_lines, 5);
    assert!(model.triangles.is_empty());
}

#[test]
fn vertex_records() {
    let model = parse_str("v -1 1 0\nv -1.0000 0.5000 0.0000\nv 1 0 0\nv 1 1 0\n").unwrap();

    assert_eq!(model.vertices, vec![
        Vector3::new(-1.0, 1.0, 0.0),
        Vector3::new(-1.0, 0.5, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0),
    ]);
}

#[test]
fn triangulating_polygons() {
    let model = parse_str("\
v -1 1 0
v -1 0 0
v 1 0 0
v 1 1 0
v 0 2 0

f 1 2 3 4 5
").unwrap();
    let v = &model.vertices;

    assert_eq!(model.triangles.len(), 3);
    assert_eq!(model.triangles[0].vertices, [v[0], v[1], v[2]]);
    assert_eq!(model.triangles[1].vertices, [v[0], v[2], v[3]]);
    assert_eq!(model.triangles[2].vertices, [v[0], v[3], v[4]]);
}

#[test]
fn faces_with_texcoords_and_normals() {
    let model = parse_str("\
v 0 1 0
v -1 0 0
v 1 0 0

vt 0 0
vt 1 0
vt 0 1

vn -1 0 0
vn 1 0 0
vn 0 1 0

f 1//3 2//1 3//2
f 1/1/3 2/2/1 3/3/2
").unwrap();
    let (t1, t2) = (model.triangles[0], model.triangles[1]);

    assert_eq!(t1.normals, [model.normals[2], model.normals[0], model.normals[1]]);
    assert!(t1.texcoords.is_none());
    assert_eq!(t1.normals, t2.normals);
    assert_eq!(t2.texcoords, Some([
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
    ]));
}

#[test]
fn forward_reference_is_rejected() {
    let err = parse_str("v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n").unwrap_err();

    assert!(matches!(err, ObjError::BadIndex { line: 3, pool: "vertex", index: 3 }));
}

#[test]
fn zero_index_is_rejected() {
    let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();

    assert!(matches!(err, ObjError::BadIndex { index: 0, .. }));
}

#[test]
fn malformed_vertex() {
    let err = parse_str("v 1 two 3\n").unwrap_err();

    assert!(matches!(err, ObjError::Malformed { line: 1, record: "v" }));
}

#[test]
fn transform_is_baked_in() {
    let mut model = parse_str("v 0 1 0\nv -1 0 0\nv 1 0 0\nf 1 2 3\n").unwrap();
    model.apply_transform(&Transform::new().translate(Vector3::new(0.0, 0.0, 5.0)));

    assert_eq!(model.vertices[0], Vector3::new(0.0, 1.0, 5.0));
    assert_eq!(model.triangles[0].vertices[0], Vector3::new(0.0, 1.0, 5.0));
    assert_eq!(model.triangles[0].normals[0], Vector3::new(0.0, 0.0, 1.0));
}
