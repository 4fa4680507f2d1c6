use color_eyre::Result;

/// Flat runtime options for the globe, resolved once at startup.
///
/// Every field can be overridden with a GLOBE_-prefixed environment
/// variable (GLOBE_SUN_INTENSITY, GLOBE_AMBIENT_FLOOR, ...). Each option has
/// exactly one effect point: a shader uniform or the log verbosity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeSettings {
    /// Scale applied to the lit side of the terminator blend.
    pub sun_intensity: f32,
    /// Lower bound of the day/night mix; keeps the night side off true black.
    pub ambient_floor: f32,
    /// City-light emission keyed to day-texture luminance.
    pub emission_intensity: f32,
    /// Normal perturbation scale for the bump sample.
    pub bump_scale: f32,
    /// Distance of the sun point from the globe center.
    pub sun_distance: f32,
    /// Verbose per-frame logging.
    pub debug: bool,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            sun_intensity: 1.2,
            ambient_floor: 0.3,
            emission_intensity: 0.25,
            bump_scale: 0.02,
            sun_distance: 50.0,
            debug: false,
        }
    }
}

impl GlobeSettings {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        use config::Config;

        let defaults = Self::default();
        let settings = Config::builder()
            .add_source(config::Environment::with_prefix("GLOBE"))
            .set_default("sun_intensity", defaults.sun_intensity as f64)?
            .set_default("ambient_floor", defaults.ambient_floor as f64)?
            .set_default("emission_intensity", defaults.emission_intensity as f64)?
            .set_default("bump_scale", defaults.bump_scale as f64)?
            .set_default("sun_distance", defaults.sun_distance as f64)?
            .set_default("debug", defaults.debug)?
            .build()?;

        Ok(Self {
            sun_intensity: settings.get_float("sun_intensity")? as f32,
            ambient_floor: settings.get_float("ambient_floor")? as f32,
            emission_intensity: settings.get_float("emission_intensity")? as f32,
            bump_scale: settings.get_float("bump_scale")? as f32,
            sun_distance: settings.get_float("sun_distance")? as f32,
            debug: settings.get_bool("debug")?,
        })
    }

    /// There is no process environment in the browser; the defaults apply.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Result<Self> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = GlobeSettings::default();
        assert_eq!(settings.sun_intensity, 1.2);
        assert_eq!(settings.ambient_floor, 0.3);
        assert_eq!(settings.emission_intensity, 0.25);
        assert_eq!(settings.bump_scale, 0.02);
        assert_eq!(settings.sun_distance, 50.0);
        assert!(!settings.debug);
    }
}
