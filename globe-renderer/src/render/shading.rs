use glam::Vec3;

/// Terminator band: illumination below this is full night...
pub const TERMINATOR_DARK: f32 = -0.2;
/// ...and above this is full day.
pub const TERMINATOR_LIGHT: f32 = 0.3;

/// Night side keeps a dim copy of the day color.
pub const NIGHT_BASE: f32 = 0.05;

/// Warm tint of the city-light emission term.
pub const EMISSION_TINT: Vec3 = Vec3::new(1.0, 0.85, 0.6);

/// These functions mirror the WGSL in `resources/shaders/earth.wgsl` so the
/// terminator blend is unit-testable on the CPU. Keep the two in sync.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Day/night blend factor for a surface point.
///
/// `sun_direction` points from the sun toward the globe center, so the lit
/// side is where the normal opposes it. The result never falls below the
/// ambient floor, which keeps the night side off true black.
pub fn day_night_mix(normal: Vec3, sun_direction: Vec3, ambient_floor: f32) -> f32 {
    let illumination = -normal.dot(sun_direction);
    smoothstep(TERMINATOR_DARK, TERMINATOR_LIGHT, illumination).max(ambient_floor)
}

/// Rec. 601 luma of a linear RGB sample.
pub fn luminance(color: Vec3) -> f32 {
    color.dot(Vec3::new(0.299, 0.587, 0.114))
}

/// Night-side color: a dim copy of the day color plus a city-light emission
/// term keyed to the day texture's brightness.
pub fn night_color(day: Vec3, emission_intensity: f32) -> Vec3 {
    day * NIGHT_BASE + EMISSION_TINT * luminance(day) * emission_intensity
}

/// Final surface color of the terminator blend.
pub fn terminator_color(
    day: Vec3,
    normal: Vec3,
    sun_direction: Vec3,
    ambient_floor: f32,
    emission_intensity: f32,
) -> Vec3 {
    let mix = day_night_mix(normal, sun_direction, ambient_floor);
    night_color(day, emission_intensity).lerp(day, mix)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn mix_for_illumination(illumination: f32, floor: f32) -> f32 {
        // A normal facing straight along -sun_direction has illumination 1;
        // construct the pair for an arbitrary illumination value.
        let normal = Vec3::new(
            illumination,
            (1.0 - illumination * illumination).max(0.0).sqrt(),
            0.0,
        );
        day_night_mix(normal, Vec3::new(-1.0, 0.0, 0.0), floor)
    }

    #[test]
    fn zero_dot_lands_inside_the_band() {
        let mix = mix_for_illumination(0.0, 0.0);
        assert!(mix > 0.0 && mix < 1.0, "mix at the terminator: {mix}");
        // smoothstep(-0.2, 0.3, 0.0) with t = 0.4
        assert_relative_eq!(mix, 0.352, epsilon = 1e-3);
    }

    #[test]
    fn mix_is_monotonic_in_illumination() {
        let mut previous = -1.0_f32;
        let mut x = -1.0_f32;
        while x <= 1.0 {
            let mix = mix_for_illumination(x, 0.0);
            assert!(mix >= previous, "mix decreased at illumination {x}");
            previous = mix;
            x += 0.01;
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.15)]
    #[case(0.3)]
    fn mix_never_drops_below_the_ambient_floor(#[case] floor: f32) {
        let mut x = -1.0_f32;
        while x <= 1.0 {
            assert!(mix_for_illumination(x, floor) >= floor);
            x += 0.05;
        }
    }

    #[test]
    fn full_day_and_full_night_saturate() {
        assert_relative_eq!(mix_for_illumination(1.0, 0.0), 1.0);
        assert_relative_eq!(mix_for_illumination(-1.0, 0.0), 0.0);
    }

    #[test]
    fn night_color_scales_with_day_luminance() {
        let bright = night_color(Vec3::splat(1.0), 0.25);
        let dark = night_color(Vec3::splat(0.1), 0.25);
        assert!(bright.length() > dark.length());
        // With zero emission only the dim base remains.
        let base_only = night_color(Vec3::splat(1.0), 0.0);
        assert_relative_eq!(base_only.x, NIGHT_BASE, epsilon = 1e-6);
    }

    #[test]
    fn terminator_color_reaches_day_color_on_the_lit_side() {
        let day = Vec3::new(0.2, 0.5, 0.8);
        let sun_direction = Vec3::new(-1.0, 0.0, 0.0);
        let lit = terminator_color(day, Vec3::X, sun_direction, 0.3, 0.25);
        assert_relative_eq!(lit.x, day.x, epsilon = 1e-5);
        assert_relative_eq!(lit.y, day.y, epsilon = 1e-5);
        assert_relative_eq!(lit.z, day.z, epsilon = 1e-5);
    }
}
