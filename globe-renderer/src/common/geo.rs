use glam::Vec3;

/// Radius of the rendered globe in scene units.
pub const GLOBE_RADIUS: f32 = 5.0;

/// Converts a latitude/longitude pair in degrees to a point on a sphere of
/// the given radius.
///
/// This is the single canonical conversion: marker placement and
/// camera-focus targeting both go through here, so the two can never drift
/// apart.
pub fn lat_lng_to_vector(latitude: f64, longitude: f64, radius: f32) -> Vec3 {
    let phi = (90.0 - latitude).to_radians();
    let theta = (longitude + 180.0).to_radians();

    let x = -(radius as f64) * phi.sin() * theta.cos();
    let y = (radius as f64) * phi.cos();
    let z = (radius as f64) * phi.sin() * theta.sin();

    Vec3::new(x as f32, y as f32, z as f32)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(38.8951, -77.0364)]
    #[case(-33.4489, -70.6693)]
    #[case(51.5074, -0.1278)]
    #[case(-90.0, 45.0)]
    fn points_lie_on_the_sphere(#[case] lat: f64, #[case] lng: f64) {
        let p = lat_lng_to_vector(lat, lng, GLOBE_RADIUS);
        assert_relative_eq!(p.length(), GLOBE_RADIUS, epsilon = 1e-4);
    }

    #[test]
    fn north_pole_maps_to_axis_regardless_of_longitude() {
        for lng in [-180.0, -77.0, 0.0, 13.5, 179.9] {
            let p = lat_lng_to_vector(90.0, lng, GLOBE_RADIUS);
            assert_relative_eq!(p.x, 0.0, epsilon = 1e-4);
            assert_relative_eq!(p.y, GLOBE_RADIUS, epsilon = 1e-4);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn longitude_wraps_every_360_degrees() {
        let a = lat_lng_to_vector(48.8566, 2.3522, GLOBE_RADIUS);
        let b = lat_lng_to_vector(48.8566, 2.3522 + 360.0, GLOBE_RADIUS);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
    }

    #[test]
    fn distinct_coordinates_map_to_distinct_points() {
        use itertools::Itertools;

        let coords = [
            (0.0, 0.0),
            (0.0, 10.0),
            (10.0, 0.0),
            (45.0, 45.0),
            (-45.0, 45.0),
            (45.0, -45.0),
        ];
        for (&(lat_a, lng_a), &(lat_b, lng_b)) in coords.iter().tuple_combinations() {
            let a = lat_lng_to_vector(lat_a, lng_a, GLOBE_RADIUS);
            let b = lat_lng_to_vector(lat_b, lng_b, GLOBE_RADIUS);
            assert!((a - b).length() > 1e-3, "{lat_a},{lng_a} vs {lat_b},{lng_b}");
        }
    }

    #[test]
    fn conversion_is_continuous_in_longitude() {
        let step = 0.001;
        let a = lat_lng_to_vector(20.0, 100.0, GLOBE_RADIUS);
        let b = lat_lng_to_vector(20.0, 100.0 + step, GLOBE_RADIUS);
        // A milli-degree step moves the point by roughly radius * step in
        // radians, never by a jump.
        assert!((a - b).length() < GLOBE_RADIUS * 0.001);
    }
}
