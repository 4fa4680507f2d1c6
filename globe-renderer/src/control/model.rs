use glam::Vec3;
use thiserror::Error;

use crate::data::markers::{MarkerModel, ModelMesh};

/// Largest extent of a custom marker after normalization, in scene units.
pub const MARKER_MODEL_SIZE: f32 = 0.3;

#[derive(Error, Debug)]
pub enum ModelParseError {
    #[error("model contains no triangles")]
    Empty,
    #[error("invalid vertex on line {0}")]
    InvalidVertex(usize),
    #[error("invalid face on line {0}")]
    InvalidFace(usize),
    #[error("face index {0} out of range")]
    IndexOutOfRange(i64),
}

struct PendingMesh {
    // Global vertex index -> local index, plus local buffers.
    remap: Vec<Option<u32>>,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl PendingMesh {
    fn new() -> Self {
        Self {
            remap: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn push_index(&mut self, global: usize, positions: &[Vec3]) {
        if self.remap.len() < positions.len() {
            self.remap.resize(positions.len(), None);
        }
        let local = match self.remap[global] {
            Some(local) => local,
            None => {
                let local = self.vertices.len() as u32;
                self.vertices.push(positions[global]);
                self.remap[global] = Some(local);
                local
            }
        };
        self.indices.push(local);
    }
}

/// Parses a minimal OBJ subset: `v` positions and `f` faces (fan
/// triangulated), with `o`/`g` starting a new mesh. Everything else is
/// skipped. The result is normalized so the model's largest extent is
/// [`MARKER_MODEL_SIZE`] and its center sits at the origin.
pub fn parse_obj(source: &str) -> Result<MarkerModel, ModelParseError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut meshes: Vec<PendingMesh> = Vec::new();
    let mut current = PendingMesh::new();

    for (line_number, line) in source.lines().enumerate() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut component = || {
                    fields
                        .next()
                        .and_then(|f| f.parse::<f32>().ok())
                        .ok_or(ModelParseError::InvalidVertex(line_number + 1))
                };
                let (x, y, z) = (component()?, component()?, component()?);
                positions.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let corners = fields
                    .map(|field| resolve_index(field, positions.len(), line_number + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ModelParseError::InvalidFace(line_number + 1));
                }
                for i in 1..corners.len() - 1 {
                    current.push_index(corners[0], &positions);
                    current.push_index(corners[i], &positions);
                    current.push_index(corners[i + 1], &positions);
                }
            }
            Some("o") | Some("g") => {
                if !current.indices.is_empty() {
                    meshes.push(std::mem::replace(&mut current, PendingMesh::new()));
                }
            }
            _ => {}
        }
    }
    if !current.indices.is_empty() {
        meshes.push(current);
    }
    if meshes.is_empty() {
        return Err(ModelParseError::Empty);
    }

    Ok(normalize(meshes))
}

/// OBJ indices are 1-based; negative values count back from the most
/// recently read vertex.
fn resolve_index(
    field: &str,
    vertex_count: usize,
    line_number: usize,
) -> Result<usize, ModelParseError> {
    let index_part = field.split('/').next().unwrap_or(field);
    let raw: i64 = index_part
        .parse()
        .map_err(|_| ModelParseError::InvalidFace(line_number))?;

    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        vertex_count as i64 + raw
    } else {
        return Err(ModelParseError::IndexOutOfRange(raw));
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(ModelParseError::IndexOutOfRange(raw));
    }
    Ok(resolved as usize)
}

fn normalize(meshes: Vec<PendingMesh>) -> MarkerModel {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for mesh in &meshes {
        for vertex in &mesh.vertices {
            min = min.min(*vertex);
            max = max.max(*vertex);
        }
    }
    let center = (min + max) / 2.0;
    let extent = (max - min).max_element();
    let scale = if extent > 0.0 {
        MARKER_MODEL_SIZE / extent
    } else {
        1.0
    };

    let meshes: Vec<ModelMesh> = meshes
        .into_iter()
        .map(|mesh| {
            let vertices: Vec<Vec3> = mesh
                .vertices
                .into_iter()
                .map(|v| (v - center) * scale)
                .collect();
            let mesh_center =
                vertices.iter().copied().sum::<Vec3>() / vertices.len().max(1) as f32;
            let radius = vertices
                .iter()
                .map(|v| (*v - mesh_center).length())
                .fold(0.0, f32::max);
            ModelMesh {
                vertices,
                indices: mesh.indices,
                center: mesh_center,
                radius,
            }
        })
        .collect();

    let bounding_radius = meshes
        .iter()
        .flat_map(|mesh| mesh.vertices.iter())
        .map(|v| v.length())
        .fold(0.0, f32::max);

    MarkerModel {
        meshes,
        bounding_radius,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn parses_a_single_triangle() {
        let model = parse_obj(TRIANGLE).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].indices.len(), 3);
        assert_eq!(model.meshes[0].vertices.len(), 3);
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let model = parse_obj(source).unwrap();
        assert_eq!(model.meshes[0].indices.len(), 6);
    }

    #[test]
    fn slash_separated_and_negative_indices_resolve() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 -2/2 -1\n";
        let model = parse_obj(source).unwrap();
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn groups_split_into_meshes() {
        let source = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 2 0 0
v 3 0 0
v 2 1 0
f 4 5 6
";
        let model = parse_obj(source).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[1].vertices.len(), 3);
    }

    #[test]
    fn model_is_normalized_to_the_marker_size() {
        let source = "v -10 0 0\nv 10 0 0\nv 0 5 0\nf 1 2 3\n";
        let model = parse_obj(source).unwrap();
        let width = model.meshes[0]
            .vertices
            .iter()
            .map(|v| v.x)
            .fold(f32::NEG_INFINITY, f32::max)
            - model.meshes[0]
                .vertices
                .iter()
                .map(|v| v.x)
                .fold(f32::INFINITY, f32::min);
        assert_relative_eq!(width, MARKER_MODEL_SIZE, epsilon = 1e-5);
        assert!(model.bounding_radius <= MARKER_MODEL_SIZE);
    }

    #[test]
    fn garbage_faces_and_empty_files_are_errors() {
        assert!(matches!(parse_obj(""), Err(ModelParseError::Empty)));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n"),
            Err(ModelParseError::IndexOutOfRange(9))
        ));
        assert!(matches!(
            parse_obj("v 0 0 zzz\n"),
            Err(ModelParseError::InvalidVertex(1))
        ));
    }
}
