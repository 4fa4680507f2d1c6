use std::pin::Pin;
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use color_eyre::{Report, Result};
use globe_common::GeoCoord;
use tokio::{
    sync::mpsc::{Sender, channel},
    task::JoinHandle,
};
use tokio_with_wasm::alias as tokio;
use winit::{
    event::{DeviceEvent, WindowEvent},
    event_loop::EventLoopProxy,
};

use crate::{
    app::{ApplicationEvent, ApplicationSettings},
    common::{geo::GLOBE_RADIUS, sun::sun_direction},
    control::{
        background_runner::{BackgroundEvent, BackgroundRunner},
        camera_controller::CameraController,
        focus_animator::{FocusAnimator, FocusProgress},
        pointer_controller::PointerController,
    },
    data::{application_data::ApplicationData, selection::ClickOutcome},
};

pub enum RunnerState {
    Initialized(BackgroundRunner),
    Started(JoinHandle<()>),
}

pub struct ApplicationControllers {
    runner_state: Option<RunnerState>,
    event_sender: Sender<BackgroundEvent>,
    pub camera_controller: CameraController,
    pub pointer_controller: PointerController,
    pub focus_animator: FocusAnimator,
    previous_instant: Instant,
}

impl ApplicationControllers {
    pub fn new(
        render_event_loopback: EventLoopProxy<ApplicationEvent>,
        settings: Arc<ApplicationSettings>,
    ) -> Self {
        let (event_sender, event_receiver) = channel(128);

        let runner = BackgroundRunner::new(event_receiver, render_event_loopback, settings);

        ApplicationControllers {
            runner_state: Some(RunnerState::Initialized(runner)),
            event_sender,
            camera_controller: CameraController::new(),
            pointer_controller: PointerController::default(),
            focus_animator: FocusAnimator::default(),
            previous_instant: Instant::now(),
        }
    }

    pub fn configure_background_runner(
        &mut self,
        async_runner: impl FnOnce(
            Pin<Box<dyn Future<Output = ()> + Send + Sync + 'static>>,
        ) -> JoinHandle<()>,
    ) -> Result<(), Report> {
        if let Some(RunnerState::Initialized(mut runner)) = self.runner_state.take() {
            let pinned = Box::pin(async move { runner.run().await });
            self.runner_state = Some(RunnerState::Started(async_runner(pinned)));
        }

        Ok(())
    }

    pub fn send_event(&mut self, event: BackgroundEvent) -> Result<()> {
        // Called from the event loop thread; never block it.
        self.event_sender.try_send(event)?;
        Ok(())
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        let pointer = self.pointer_controller.process_events(event);
        let camera = self.camera_controller.process_events(event);
        pointer || camera
    }

    pub fn device_input(&mut self, event: &DeviceEvent) {
        self.camera_controller.process_device_events(event)
    }

    /// Starts a camera flight to the given coordinates; hover detection is
    /// suspended until it completes. A flight already in progress is
    /// replaced.
    pub fn focus_on(&mut self, coord: GeoCoord, data: &mut ApplicationData) {
        self.focus_animator.focus(&data.camera, coord, GLOBE_RADIUS);
        data.selection.begin_animation();
    }

    /// The per-frame tick: applies camera input, advances the focus
    /// flight, and runs hover/click hit-testing against the marker scene.
    /// Returns whether the scene needs to be re-rendered.
    pub fn update(&mut self, require_render: bool, data: &mut ApplicationData) -> bool {
        let current_instant = Instant::now();
        let time_delta = current_instant - self.previous_instant;
        self.previous_instant = current_instant;

        let mut changed = self
            .camera_controller
            .update_camera(&mut data.camera, time_delta);

        // The sun tracks the wall clock; redraw once it has moved
        // measurably, even with the camera at rest.
        let sun = sun_direction(
            chrono::Local::now().naive_local(),
            data.settings.sun_distance,
        );
        if data.sun_direction.dot(sun) < 1.0 - 1e-7 {
            data.sun_direction = sun;
            changed = true;
        }

        match self.focus_animator.advance(&mut data.camera, time_delta) {
            FocusProgress::Running => changed = true,
            FocusProgress::Completed => {
                data.selection.finish_animation();
                changed = true;
            }
            FocusProgress::Idle => {}
        }

        if !data.selection.is_animating()
            && let Some(ndc) = self.pointer_controller.ndc(data.bounds)
        {
            let hit = data
                .marker_scene
                .pick(data.camera.ray_through(ndc, data.bounds));
            changed |= data.selection.pointer_moved(hit);
        }

        for click in self.pointer_controller.take_clicks(data.bounds) {
            let hit = data
                .marker_scene
                .pick(data.camera.ray_through(click, data.bounds));
            match data.selection.click(hit) {
                ClickOutcome::Focus(index) => match data.locations.get(index).map(|l| l.coord()) {
                    Some(Ok(coord)) => self.focus_on(coord, data),
                    Some(Err(err)) => log::error!("Marker with invalid coordinates: {err}"),
                    None => log::error!("Click resolved to unknown marker {index}"),
                },
                ClickOutcome::Cleared => {}
            }
            changed = true;
        }

        require_render || changed
    }
}

impl Drop for ApplicationControllers {
    fn drop(&mut self) {
        if let Some(RunnerState::Started(handle)) = &mut self.runner_state {
            handle.abort();
        }
    }
}
