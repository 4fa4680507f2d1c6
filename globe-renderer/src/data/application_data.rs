use globe_common::Location;

use crate::{
    common::geo::GLOBE_RADIUS,
    config::GlobeSettings,
    data::{
        Size,
        camera::OrbitCamera,
        markers::{MarkerModel, MarkerScene},
        selection::SelectionState,
    },
    render::data::{BloomSettings, GlobeUniforms},
};

/// All frame state the controllers mutate and the engine reads.
pub struct ApplicationData {
    pub settings: GlobeSettings,
    pub locations: Vec<Location>,
    pub marker_scene: MarkerScene,
    pub marker_model: Option<MarkerModel>,
    /// Remembered model URL, applied on the next marker rebuild.
    pub marker_model_url: Option<String>,
    pub camera: OrbitCamera,
    pub selection: SelectionState,
    /// Unit vector from the sun toward the globe center, recomputed every
    /// tick from the wall clock.
    pub sun_direction: glam::Vec3,
    pub uniforms: GlobeUniforms,
    pub bloom: BloomSettings,
    pub bounds: Size<f32>,
}

impl ApplicationData {
    pub fn new(bounds: Size<f32>, settings: GlobeSettings) -> Self {
        let camera = OrbitCamera::default();
        let uniforms = GlobeUniforms::new(&camera, bounds, glam::Vec3::X, &settings);

        Self {
            settings,
            locations: Vec::new(),
            marker_scene: MarkerScene::default(),
            marker_model: None,
            marker_model_url: None,
            camera,
            selection: SelectionState::default(),
            sun_direction: glam::Vec3::X,
            uniforms,
            bloom: BloomSettings::default(),
            bounds,
        }
    }

    /// Installs a fresh location set and rebuilds the marker hierarchy.
    /// The selection is reset; its indices pointed into the old set.
    pub fn set_locations(&mut self, locations: Vec<Location>) {
        self.locations = locations;
        self.selection = SelectionState::default();
        self.rebuild_marker_scene();
    }

    pub fn rebuild_marker_scene(&mut self) {
        self.marker_scene = MarkerScene::build(
            &self.locations,
            GLOBE_RADIUS,
            self.marker_model.as_ref(),
        );
    }
}
