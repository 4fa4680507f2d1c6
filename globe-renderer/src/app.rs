use std::{pin::Pin, sync::Arc};

use color_eyre::Report;
use futures::channel::oneshot;
use globe_common::{GeoCoord, Location};
use tokio::task::JoinHandle;
use tokio_with_wasm::alias as tokio;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::EventLoopError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::WindowAttributes,
};

use crate::{
    config::GlobeSettings,
    control::{
        application_controllers::ApplicationControllers, background_runner::BackgroundEvent,
    },
    data::{application_data::ApplicationData, markers::MarkerModel},
    render::{
        data::BloomSettings,
        render_engine::RenderEngine,
        texture::EarthTextures,
    },
};

#[derive(Debug, Clone)]
pub struct ApplicationSettings {
    pub backend_url: String,
}

/// Everything that can reach the application from outside the render
/// thread: results of background fetches and the entry points exposed to
/// the hosting page.
pub enum ApplicationEvent {
    TerminateWithError(Report),
    LocationsReady(Vec<Location>),
    EarthTexturesReady(EarthTextures),
    MarkerModelReady(Option<MarkerModel>),
    FocusLocation(GeoCoord),
    SetMarkerModel(String),
    UpdateMarkers(Option<String>),
    SetBloomSettings {
        strength: f32,
        radius: f32,
        threshold: f32,
    },
    SetMarkerBloom {
        index: usize,
        enabled: bool,
    },
}

pub struct Application {
    engine: Option<RenderEngine>,
    controllers: ApplicationControllers,
    data: ApplicationData,
    window_attributes: WindowAttributes,
    event_loop_proxy: EventLoopProxy<ApplicationEvent>,
    surface_configured: bool,
    require_render: bool,
    receiver: Option<oneshot::Receiver<RenderEngine>>,
    resized: Option<PhysicalSize<u32>>,
}

impl Application {
    pub fn new(
        window_attributes: WindowAttributes,
        event_loop_proxy: EventLoopProxy<ApplicationEvent>,
    ) -> Self {
        let settings = Arc::new(ApplicationSettings {
            backend_url: env!("GLOBE_backend_url").to_string(),
        });

        let globe_settings = match GlobeSettings::from_env() {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Invalid globe settings, using defaults: {err}");
                GlobeSettings::default()
            }
        };

        let controllers =
            ApplicationControllers::new(event_loop_proxy.clone(), Arc::clone(&settings));

        let bounds = window_attributes
            .inner_size
            .map(|s| s.to_physical(1.0).into())
            .unwrap_or((800.0, 600.0).into());
        let data = ApplicationData::new(bounds, globe_settings);

        Self {
            engine: None,
            controllers,
            data,
            window_attributes,
            event_loop_proxy,
            surface_configured: false,
            require_render: false,
            receiver: None,
            resized: None,
        }
    }

    /// First fetches once the engine is up: textures, locations, and the
    /// custom marker model when one was requested before initialization.
    fn request_initial_data(&mut self) {
        for event in [
            BackgroundEvent::FetchEarthTextures,
            BackgroundEvent::FetchLocations,
        ] {
            if let Err(err) = self.controllers.send_event(event) {
                log::error!("{err:?}");
            }
        }
        if let Some(url) = self.data.marker_model_url.clone()
            && let Err(err) = self
                .controllers
                .send_event(BackgroundEvent::FetchMarkerModel(url))
        {
            log::error!("{err:?}");
        }
    }
}

pub struct ApplicationRunner {
    event_loop: EventLoop<ApplicationEvent>,
    app: Application,
}

impl ApplicationRunner {
    pub fn new(window_attributes: WindowAttributes) -> Self {
        let event_loop = EventLoop::<ApplicationEvent>::with_user_event()
            .build()
            .unwrap();
        let event_loop_proxy = event_loop.create_proxy();

        let app = Application::new(window_attributes, event_loop_proxy);

        Self { app, event_loop }
    }

    pub fn get_event_loop_proxy(&self) -> EventLoopProxy<ApplicationEvent> {
        self.event_loop.create_proxy()
    }

    pub fn configure_background_runner(
        &mut self,
        async_runner: impl FnOnce(Pin<Box<dyn Future<Output = ()> + Send + Sync>>) -> JoinHandle<()>,
    ) -> Result<(), Report> {
        self.app
            .controllers
            .configure_background_runner(async_runner)
    }

    pub fn run(self) -> Result<(), EventLoopError> {
        let mut app = self.app;
        self.event_loop.run_app(&mut app)
    }
}

impl ApplicationHandler<ApplicationEvent> for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(self.window_attributes.clone())
                .unwrap(),
        );

        let event_loop_proxy = self.event_loop_proxy.clone();

        let (sender, receiver) = oneshot::channel();
        self.receiver = Some(receiver);

        let initialize_engine = async move {
            match RenderEngine::new(window).await {
                Ok(render_engine) => {
                    if let Err(_) = sender.send(render_engine) {
                        log::error!("Unable to use render engine: sender expired");
                    }
                }
                Err(err) => {
                    log::error!("{err:?}");
                    if let Err(err) =
                        event_loop_proxy.send_event(ApplicationEvent::TerminateWithError(err))
                    {
                        log::error!("{err}");
                    }
                }
            }
        };

        #[cfg(target_arch = "wasm32")]
        tokio::spawn(initialize_engine);
        #[cfg(not(target_arch = "wasm32"))]
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(initialize_engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(engine) = &mut self.engine else {
            // Always record resizes; they may arrive before the wgpu engine
            // is initialized (e.g. in the browser).
            match event {
                WindowEvent::Resized(physical_size) => {
                    self.resized = Some(physical_size);
                }
                _ => (),
            }

            let mut received = None;
            if let Some(ref mut receiver) = self.receiver {
                match receiver.try_recv() {
                    Ok(Some(engine)) => received = Some(engine),
                    Ok(None) => {
                        log::debug!("No engine received at initialization");
                    }
                    Err(err) => {
                        log::debug!("Canceled engine initialization: {err:?}");
                    }
                }
            }
            if let Some(mut engine) = received {
                if let Some(physical_size) = self.resized.take() {
                    self.surface_configured = engine.resize(physical_size, &mut self.data);
                    engine.window().request_redraw();
                }
                self.engine = Some(engine);
                self.require_render = true;
                self.request_initial_data();
            }
            return;
        };

        if !self.controllers.input(&event) {
            match event {
                WindowEvent::Resized(physical_size) => {
                    self.surface_configured = engine.resize(physical_size, &mut self.data);
                    self.require_render = true;
                    // On macos the window needs to be redrawn manually after resizing
                    engine.window().request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    engine.window().request_redraw();

                    if !self.surface_configured {
                        return;
                    }

                    if self.controllers.update(self.require_render, &mut self.data) {
                        engine.update(&mut self.data);
                        match engine.render() {
                            Ok(()) => self.require_render = false,
                            // Reconfigure the surface if it's lost or outdated
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                self.surface_configured =
                                    engine.resize(engine.size(), &mut self.data);
                            }
                            // The system is out of memory, we should probably quit
                            Err(wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other) => {
                                log::error!("OutOfMemory");
                                event_loop.exit()
                            }

                            // This happens when the a frame takes too long to present
                            Err(wgpu::SurfaceError::Timeout) => {
                                log::warn!("Surface timeout")
                            }
                        }
                    }
                }
                WindowEvent::CloseRequested => event_loop.exit(),
                _ => {}
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        self.controllers.device_input(&event);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ApplicationEvent) {
        let require_render = match event {
            ApplicationEvent::TerminateWithError(err) => {
                log::error!("{err:?}");
                event_loop.exit();
                false
            }
            ApplicationEvent::LocationsReady(locations) => {
                log::info!("Loaded {} locations", locations.len());
                self.data.set_locations(locations);
                match self.engine.as_mut() {
                    Some(engine) => {
                        engine.rebuild_markers(&self.data);
                        true
                    }
                    None => false,
                }
            }
            ApplicationEvent::EarthTexturesReady(textures) => match self.engine.as_mut() {
                Some(engine) => {
                    engine.set_earth_textures(&textures);
                    true
                }
                None => false,
            },
            ApplicationEvent::MarkerModelReady(model) => {
                self.data.marker_model = model;
                self.data.rebuild_marker_scene();
                match self.engine.as_mut() {
                    Some(engine) => {
                        engine.rebuild_markers(&self.data);
                        true
                    }
                    None => false,
                }
            }
            ApplicationEvent::FocusLocation(coord) => {
                if self.engine.is_none() {
                    log::error!("Globe not initialized yet");
                    false
                } else {
                    self.controllers.focus_on(coord, &mut self.data);
                    true
                }
            }
            ApplicationEvent::SetMarkerModel(url) => {
                self.data.marker_model_url = Some(url);
                false
            }
            ApplicationEvent::UpdateMarkers(url) => {
                if self.engine.is_none() {
                    log::error!("Globe not initialized yet");
                    false
                } else {
                    if let Some(url) = url {
                        self.data.marker_model_url = Some(url);
                    }
                    if let Err(err) = self.controllers.send_event(BackgroundEvent::FetchLocations)
                    {
                        log::error!("{err:?}");
                    }
                    if let Some(url) = self.data.marker_model_url.clone()
                        && let Err(err) = self
                            .controllers
                            .send_event(BackgroundEvent::FetchMarkerModel(url))
                    {
                        log::error!("{err:?}");
                    }
                    false
                }
            }
            ApplicationEvent::SetBloomSettings {
                strength,
                radius,
                threshold,
            } => {
                if self.engine.is_none() {
                    log::error!("Post-processing not initialized yet");
                    false
                } else {
                    log::info!(
                        "Setting bloom: strength={strength}, radius={radius}, threshold={threshold}"
                    );
                    self.data.bloom = BloomSettings {
                        strength,
                        radius,
                        threshold,
                    };
                    true
                }
            }
            ApplicationEvent::SetMarkerBloom { index, enabled } => {
                if !self.data.marker_scene.set_bloom(index, enabled) {
                    log::error!("No marker with index {index}");
                    false
                } else {
                    match self.engine.as_mut() {
                        Some(engine) => {
                            engine.refresh_marker_instances(&self.data);
                            true
                        }
                        None => false,
                    }
                }
            }
        };

        self.require_render = self.require_render || require_render;
    }
}
