use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::PI;

use super::data::{MeshVertex, SphereVertex, StarInstance};

/// Segment count of the earth and atmosphere spheres.
pub const SPHERE_SEGMENTS: u32 = 128;

pub const STAR_COUNT: usize = 1500;
pub const STAR_DISTANCE: f32 = 350.0;

/// Fixed seed so the starfield is identical across runs and instances.
const STAR_SEED: u64 = 0x5354_4152;

/// A UV sphere with equirectangular texture coordinates.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> (Vec<SphereVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());

            vertices.push(SphereVertex {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
                uv: [
                    1.0 - segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ],
            });
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * (segments + 1) + segment;
            let b = a + segments + 1;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

/// A cone pointing along +Y, centered on the origin. The primitive marker
/// shape.
pub fn cone(radius: f32, height: f32, segments: u32) -> (Vec<MeshVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(segments as usize + 2);
    let mut indices = Vec::with_capacity(segments as usize * 6);

    let apex = 0;
    vertices.push(MeshVertex {
        position: [0.0, height / 2.0, 0.0],
    });
    let base_center = 1;
    vertices.push(MeshVertex {
        position: [0.0, -height / 2.0, 0.0],
    });

    for segment in 0..segments {
        let theta = 2.0 * PI * segment as f32 / segments as f32;
        vertices.push(MeshVertex {
            position: [radius * theta.cos(), -height / 2.0, radius * theta.sin()],
        });
    }

    for segment in 0..segments {
        let current = 2 + segment;
        let next = 2 + (segment + 1) % segments;
        // Side face and base face.
        indices.extend_from_slice(&[apex, next, current]);
        indices.extend_from_slice(&[base_center, current, next]);
    }

    (vertices, indices)
}

/// Stars uniformly distributed on a far sphere, with jittered sizes. The
/// seed is fixed, so the field is deterministic.
pub fn star_field(count: usize, distance: f32) -> Vec<StarInstance> {
    let mut rng = ChaCha8Rng::seed_from_u64(STAR_SEED);

    (0..count)
        .map(|_| {
            let theta = rng.gen_range(0.0..2.0 * PI);
            let phi = (rng.gen_range(-1.0..1.0_f32)).acos();

            StarInstance {
                position: [
                    distance * phi.sin() * theta.cos(),
                    distance * phi.sin() * theta.sin(),
                    distance * phi.cos(),
                ],
                size: rng.gen_range(0.1..0.7),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn sphere_has_expected_counts_and_radius() {
        let (vertices, indices) = uv_sphere(5.0, 16, 8);
        assert_eq!(vertices.len(), 17 * 9);
        assert_eq!(indices.len(), 16 * 8 * 6);
        for vertex in &vertices {
            let p = Vec3::from_array(vertex.position);
            assert_relative_eq!(p.length(), 5.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn sphere_poles_sit_on_the_y_axis() {
        let (vertices, _) = uv_sphere(5.0, 16, 8);
        assert_relative_eq!(vertices.first().unwrap().position[1], 5.0, epsilon = 1e-4);
        assert_relative_eq!(vertices.last().unwrap().position[1], -5.0, epsilon = 1e-4);
    }

    #[test]
    fn cone_apex_points_up() {
        let (vertices, indices) = cone(0.1, 0.1, 8);
        assert_eq!(vertices.len(), 10);
        assert_eq!(indices.len(), 8 * 6);
        assert_relative_eq!(vertices[0].position[1], 0.05);
    }

    #[test]
    fn star_field_is_deterministic_and_on_the_far_sphere() {
        let a = star_field(STAR_COUNT, STAR_DISTANCE);
        let b = star_field(STAR_COUNT, STAR_DISTANCE);
        assert_eq!(a.len(), STAR_COUNT);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.size, y.size);
        }
        for star in &a {
            let p = Vec3::from_array(star.position);
            assert_relative_eq!(p.length(), STAR_DISTANCE, epsilon = 1e-2);
            assert!(star.size >= 0.1 && star.size < 0.7);
        }
    }
}
