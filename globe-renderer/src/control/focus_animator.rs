use std::time::Duration;

use glam::Vec3;
use globe_common::GeoCoord;

use crate::{
    common::geo::lat_lng_to_vector,
    data::camera::{MAX_DISTANCE, MIN_DISTANCE, OrbitCamera},
};

pub const FOCUS_DURATION: Duration = Duration::from_millis(1000);

/// How far past the surface point the camera settles.
pub const PULL_BACK: f32 = 1.8;

/// Decelerates toward completion.
pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    start: Vec3,
    target: Vec3,
    elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusProgress {
    Idle,
    Running,
    Completed,
}

/// Eases the camera eye toward a focused location over a fixed duration.
/// The camera keeps looking at the globe center throughout; only the eye
/// moves. A focus request while a flight is in progress interrupts it and
/// starts a fresh flight from the current eye.
#[derive(Debug, Default)]
pub struct FocusAnimator {
    flight: Option<Flight>,
}

impl FocusAnimator {
    pub fn focus(&mut self, camera: &OrbitCamera, coord: GeoCoord, sphere_radius: f32) {
        let target = lat_lng_to_vector(coord.latitude, coord.longitude, sphere_radius) * PULL_BACK;
        // Stay inside the orbit clamp so the controls take over seamlessly.
        let target = target.normalize() * target.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.flight = Some(Flight {
            start: camera.eye,
            target,
            elapsed: Duration::ZERO,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.flight.is_some()
    }

    /// Advances the flight by a frame's time delta, writing the new eye
    /// position. Returns `Completed` exactly once, on the tick the flight
    /// finishes.
    pub fn advance(&mut self, camera: &mut OrbitCamera, time_delta: Duration) -> FocusProgress {
        let Some(flight) = &mut self.flight else {
            return FocusProgress::Idle;
        };

        flight.elapsed += time_delta;
        let progress =
            (flight.elapsed.as_secs_f32() / FOCUS_DURATION.as_secs_f32()).clamp(0.0, 1.0);
        camera.eye = flight.start.lerp(flight.target, ease_out_quad(progress));

        if progress >= 1.0 {
            self.flight = None;
            FocusProgress::Completed
        } else {
            FocusProgress::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use crate::common::geo::GLOBE_RADIUS;

    use super::*;

    fn coord(lat: f64, lng: f64) -> GeoCoord {
        GeoCoord::new(lat, lng).unwrap()
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.0, 1.0)]
    fn ease_fixes_the_endpoints(#[case] t: f32, #[case] expected: f32) {
        assert_relative_eq!(ease_out_quad(t), expected);
    }

    #[test]
    fn ease_is_monotonic_on_the_unit_interval() {
        let mut previous = 0.0_f32;
        for i in 1..=100 {
            let value = ease_out_quad(i as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn flight_starts_at_the_current_eye_and_ends_pulled_back() {
        let mut camera = OrbitCamera::default();
        let start = camera.eye;
        let mut animator = FocusAnimator::default();
        animator.focus(&camera, coord(38.8951, -77.0364), GLOBE_RADIUS);

        assert_eq!(
            animator.advance(&mut camera, Duration::ZERO),
            FocusProgress::Running
        );
        assert_relative_eq!(camera.eye.x, start.x, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.y, start.y, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, start.z, epsilon = 1e-5);

        assert_eq!(
            animator.advance(&mut camera, FOCUS_DURATION),
            FocusProgress::Completed
        );
        let expected =
            lat_lng_to_vector(38.8951, -77.0364, GLOBE_RADIUS) * PULL_BACK;
        assert_relative_eq!(camera.eye.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.z, expected.z, epsilon = 1e-4);
        assert!(!animator.is_animating());
    }

    #[test]
    fn completion_is_reported_once() {
        let mut camera = OrbitCamera::default();
        let mut animator = FocusAnimator::default();
        animator.focus(&camera, coord(0.0, 0.0), GLOBE_RADIUS);

        assert_eq!(
            animator.advance(&mut camera, FOCUS_DURATION),
            FocusProgress::Completed
        );
        assert_eq!(
            animator.advance(&mut camera, FOCUS_DURATION),
            FocusProgress::Idle
        );
    }

    #[test]
    fn a_new_request_interrupts_the_flight_in_progress() {
        let mut camera = OrbitCamera::default();
        let mut animator = FocusAnimator::default();
        animator.focus(&camera, coord(0.0, 0.0), GLOBE_RADIUS);
        animator.advance(&mut camera, Duration::from_millis(500));
        let halfway = camera.eye;

        // Retarget mid-flight: the replacement starts from the current eye.
        animator.focus(&camera, coord(51.5074, -0.1278), GLOBE_RADIUS);
        animator.advance(&mut camera, Duration::ZERO);
        assert_relative_eq!(camera.eye.x, halfway.x, epsilon = 1e-5);

        animator.advance(&mut camera, FOCUS_DURATION);
        let expected = lat_lng_to_vector(51.5074, -0.1278, GLOBE_RADIUS) * PULL_BACK;
        assert_relative_eq!(camera.eye.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.z, expected.z, epsilon = 1e-4);
    }
}
