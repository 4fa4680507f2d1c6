use glam::{Mat4, Quat, Vec3};
use globe_common::Location;

use crate::{common::geo::lat_lng_to_vector, data::camera::Ray};

/// Cone base radius and height of the primitive marker.
pub const MARKER_SIZE: f32 = 0.1;
pub const MARKER_HEIGHT: f32 = 0.1;

/// Markers sit slightly above the surface.
pub const MARKER_ALTITUDE: f32 = 1.02;

/// Pick radius of the primitive cone marker.
const CONE_PICK_RADIUS: f32 = 0.12;

/// One mesh of a custom marker model, in model-local space.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub center: Vec3,
    pub radius: f32,
}

/// A custom marker model: one or more meshes sharing a placement.
#[derive(Debug, Clone)]
pub struct MarkerModel {
    pub meshes: Vec<ModelMesh>,
    pub bounding_radius: f32,
}

/// A node of the hit-testable marker hierarchy. Only nodes carrying
/// geometry are ray-tested; location data may live on an ancestor.
#[derive(Debug, Clone)]
pub struct MarkerNode {
    pub center: Vec3,
    pub radius: f32,
    pub location: Option<usize>,
    pub parent: Option<usize>,
    pub pickable: bool,
}

/// Per-location render state: where the marker sits and whether it takes
/// part in the bloom pass.
#[derive(Debug, Clone)]
pub struct Marker {
    pub transform: Mat4,
    pub bloom: bool,
}

/// The marker collection: a root-less forest of marker nodes (one subtree
/// per location) plus per-location placement transforms.
#[derive(Debug, Clone, Default)]
pub struct MarkerScene {
    nodes: Vec<MarkerNode>,
    markers: Vec<Marker>,
}

impl MarkerScene {
    /// Builds the scene for a set of locations. With a custom model, each
    /// location gets a parent node carrying the location data and one
    /// pickable child node per model mesh; with the primitive cone the
    /// marker node itself carries both geometry and location data.
    pub fn build(locations: &[Location], sphere_radius: f32, model: Option<&MarkerModel>) -> Self {
        let mut nodes = Vec::new();
        let mut markers = Vec::with_capacity(locations.len());

        for (index, location) in locations.iter().enumerate() {
            let surface = lat_lng_to_vector(location.latitude, location.longitude, sphere_radius);
            let position = surface * MARKER_ALTITUDE;
            let outward = Quat::from_rotation_arc(Vec3::Y, surface.normalize());
            let transform = Mat4::from_rotation_translation(outward, position);

            match model {
                Some(model) => {
                    let parent = nodes.len();
                    nodes.push(MarkerNode {
                        center: position,
                        radius: model.bounding_radius,
                        location: Some(index),
                        parent: None,
                        pickable: false,
                    });
                    for mesh in &model.meshes {
                        nodes.push(MarkerNode {
                            center: position + outward * mesh.center,
                            radius: mesh.radius,
                            location: None,
                            parent: Some(parent),
                            pickable: true,
                        });
                    }
                }
                None => {
                    nodes.push(MarkerNode {
                        center: position,
                        radius: CONE_PICK_RADIUS,
                        location: Some(index),
                        parent: None,
                        pickable: true,
                    });
                }
            }

            markers.push(Marker {
                transform,
                bloom: false,
            });
        }

        Self { nodes, markers }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn set_bloom(&mut self, index: usize, enabled: bool) -> bool {
        match self.markers.get_mut(index) {
            Some(marker) => {
                marker.bloom = enabled;
                true
            }
            None => false,
        }
    }

    /// Nearest pickable node hit by the ray.
    fn hit_test(&self, ray: Ray) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.pickable)
            .filter_map(|(i, node)| {
                intersect_sphere(ray, node.center, node.radius).map(|t| (i, t))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    /// Walks the ancestor chain of a node until one carries location data.
    fn resolve_location(&self, mut node: usize) -> Option<usize> {
        loop {
            let current = &self.nodes[node];
            if let Some(location) = current.location {
                return Some(location);
            }
            node = current.parent?;
        }
    }

    /// Ray-casts into the marker hierarchy and resolves the hit to a
    /// location index. A hit whose ancestor chain carries no location data
    /// counts as no hit.
    pub fn pick(&self, ray: Ray) -> Option<usize> {
        self.hit_test(ray)
            .and_then(|node| self.resolve_location(node))
    }
}

fn intersect_sphere(ray: Ray, center: Vec3, radius: f32) -> Option<f32> {
    let offset = ray.origin - center;
    let b = ray.direction.dot(offset);
    let c = offset.dot(offset) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let near = -b - sqrt_d;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + sqrt_d;
    (far >= 0.0).then_some(far)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::{
        common::geo::GLOBE_RADIUS,
        data::{Size, camera::OrbitCamera},
    };

    use super::*;

    fn location(name: &str, lat: f64, lng: f64) -> Location {
        Location {
            country: "Testland".into(),
            city: name.into(),
            point_name: name.into(),
            description: String::new(),
            latitude: lat,
            longitude: lng,
            date_added: "2025-05-18T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn ray_hits_a_sphere_in_front_of_it() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        let t = intersect_sphere(ray, Vec3::ZERO, 1.0).unwrap();
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_misses_a_sphere_behind_it() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(intersect_sphere(ray, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn cone_markers_carry_their_location() {
        let scene = MarkerScene::build(
            &[location("a", 0.0, 0.0), location("b", 45.0, 90.0)],
            GLOBE_RADIUS,
            None,
        );
        let target = scene.nodes[1].center;
        let origin = target * 3.0;
        let ray = Ray {
            origin,
            direction: (target - origin).normalize(),
        };
        assert_eq!(scene.pick(ray), Some(1));
    }

    #[test]
    fn model_hits_resolve_through_the_ancestor_chain() {
        let model = MarkerModel {
            meshes: vec![
                ModelMesh {
                    vertices: vec![],
                    indices: vec![],
                    center: Vec3::new(0.0, 0.05, 0.0),
                    radius: 0.08,
                },
                ModelMesh {
                    vertices: vec![],
                    indices: vec![],
                    center: Vec3::new(0.0, 0.15, 0.0),
                    radius: 0.05,
                },
            ],
            bounding_radius: 0.2,
        };
        let scene = MarkerScene::build(&[location("a", 10.0, 20.0)], GLOBE_RADIUS, Some(&model));

        // Aim at the second mesh, which itself carries no location data.
        let target = scene.nodes[2].center;
        let origin = target * 3.0;
        let ray = Ray {
            origin,
            direction: (target - origin).normalize(),
        };
        assert_eq!(scene.pick(ray), Some(0));
    }

    #[test]
    fn orphan_nodes_count_as_no_hit() {
        let mut scene = MarkerScene::build(&[location("a", 0.0, 0.0)], GLOBE_RADIUS, None);
        // A stray pickable node with no location anywhere in its chain.
        scene.nodes.push(MarkerNode {
            center: Vec3::new(0.0, 20.0, 0.0),
            radius: 0.5,
            location: None,
            parent: None,
            pickable: true,
        });
        let ray = Ray {
            origin: Vec3::new(0.0, 30.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        // The stray node is hit first along this ray but resolves to nothing.
        assert_eq!(scene.pick(ray), None);
    }

    #[test]
    fn screen_projection_ray_casts_back_to_the_respective_location() {
        let locations = [location("equator", 0.0, 0.0), location("pole", 90.0, 0.0)];
        let scene = MarkerScene::build(&locations, GLOBE_RADIUS, None);
        let camera = OrbitCamera::default();
        let bounds = Size::from((800.0, 600.0));
        let mut selection = crate::data::selection::SelectionState::default();

        for (index, node) in scene.nodes.iter().enumerate() {
            let ndc = camera.project(node.center, bounds).unwrap();
            let ray = camera.ray_through(ndc, bounds);
            let hit = scene.pick(ray);
            assert_eq!(hit, Some(index));

            // Hovering at the projected position surfaces that location.
            selection.pointer_moved(hit);
            assert_eq!(selection.panel(), Some(index));
        }
    }

    #[test]
    fn bloom_toggle_targets_a_single_marker() {
        let mut scene = MarkerScene::build(
            &[location("a", 0.0, 0.0), location("b", 10.0, 10.0)],
            GLOBE_RADIUS,
            None,
        );
        assert!(scene.set_bloom(1, true));
        assert!(!scene.markers()[0].bloom);
        assert!(scene.markers()[1].bloom);
        assert!(!scene.set_bloom(7, true));
    }
}
