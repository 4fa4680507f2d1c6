use chrono::{Datelike, NaiveDateTime, Timelike};
use glam::Vec3;
use std::f64::consts::PI;

/// Solar declination amplitude in degrees.
const DECLINATION_MAX_DEG: f64 = 23.45;

/// Position of the sun relative to the globe center for a wall-clock
/// timestamp, at the given distance.
///
/// Uses the standard solar-declination approximation
/// `23.45° · sin(2π·(dayOfYear − 81)/365)` and an hour angle of 15° per
/// hour with solar noon at 12:00. Pure over the timestamp, so tests can
/// inject a fixed clock; the render loop feeds it the current local time
/// every frame.
pub fn sun_position(now: NaiveDateTime, distance: f32) -> Vec3 {
    let day_of_year = now.ordinal() as f64;
    let declination_rad =
        (DECLINATION_MAX_DEG * (2.0 * PI * (day_of_year - 81.0) / 365.0).sin()).to_radians();

    let hour = now.hour() as f64 + now.minute() as f64 / 60.0;
    let hour_angle = ((hour - 12.0) * 15.0).to_radians();

    let d = distance as f64;
    Vec3::new(
        (d * hour_angle.cos()) as f32,
        (d * declination_rad.sin()) as f32,
        (d * hour_angle.sin()) as f32,
    )
}

/// Unit vector pointing from the sun toward the globe center, the form the
/// terminator shader consumes.
pub fn sun_direction(now: NaiveDateTime, distance: f32) -> Vec3 {
    -sun_position(now, distance).normalize()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn deterministic_for_a_fixed_timestamp() {
        let t = at(5, 18, 9, 30);
        assert_eq!(sun_position(t, 50.0), sun_position(t, 50.0));
    }

    #[test]
    fn solar_noon_puts_the_sun_on_the_positive_x_side() {
        let p = sun_position(at(3, 22, 12, 0), 50.0);
        assert_relative_eq!(p.x, 50.0, epsilon = 0.5);
        assert_relative_eq!(p.z, 0.0, epsilon = 0.5);
    }

    #[test]
    fn midnight_puts_the_sun_on_the_negative_x_side() {
        let p = sun_position(at(3, 22, 0, 0), 50.0);
        assert!(p.x < -49.0);
    }

    #[rstest]
    // Around the equinoxes the declination crosses zero; around the
    // solstices it peaks.
    #[case(3, 22, 0.0, 2.0)]
    #[case(9, 22, 0.0, 3.0)]
    #[case(6, 21, 23.45, 0.5)]
    #[case(12, 21, -23.45, 0.7)]
    fn declination_follows_the_seasons(
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected_deg: f64,
        #[case] tolerance_deg: f64,
    ) {
        let p = sun_position(at(month, day, 12, 0), 50.0);
        let declination = (p.y as f64 / 50.0).asin().to_degrees();
        assert!(
            (declination - expected_deg).abs() < tolerance_deg,
            "declination {declination} != {expected_deg}"
        );
    }

    #[test]
    fn hour_angle_sweeps_fifteen_degrees_per_hour() {
        let p1 = sun_position(at(3, 22, 13, 0), 50.0);
        let p2 = sun_position(at(3, 22, 14, 0), 50.0);
        let a1 = (p1.z).atan2(p1.x).to_degrees();
        let a2 = (p2.z).atan2(p2.x).to_degrees();
        assert_relative_eq!(a2 - a1, 15.0, epsilon = 0.01);
    }

    #[test]
    fn direction_is_unit_length_and_opposes_position() {
        let t = at(7, 4, 16, 45);
        let dir = sun_direction(t, 50.0);
        assert_relative_eq!(dir.length(), 1.0, epsilon = 1e-5);
        assert!(dir.dot(sun_position(t, 50.0)) < 0.0);
    }
}
