use std::sync::Arc;

use color_eyre::Result;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    data::{Size, application_data::ApplicationData},
    render::data::GlobeUniforms,
};

use super::{
    application_renderers::ApplicationRenderers,
    texture::{EarthTextures, Texture},
};

/// Owns the wgpu primitives and drives the frame. Everything here runs
/// synchronously on the render thread; async work hands its results over
/// through the application's user events.
pub struct RenderEngine {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth_texture: Texture,
    renderers: ApplicationRenderers,
    last_panel: Option<Option<usize>>,
}

impl RenderEngine {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Prefer an sRGB view of the surface; the shaders assume it.
        let format = {
            let mut format = surface_caps.formats[0];
            let format_srgb = format.add_srgb_suffix();
            if surface_caps.formats.contains(&format_srgb) {
                format = format_srgb;
            }
            format
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![format],
            desired_maximum_frame_latency: 2,
        };

        let depth_texture = Texture::create_depth_texture(
            &device,
            (size.width.max(1), size.height.max(1)),
            "depth texture",
        );
        let mut renderers = ApplicationRenderers::new(&device, &queue, format, size.into());
        renderers
            .text
            .resize(&queue, (size.width.max(1), size.height.max(1)).into());

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth_texture,
            renderers,
            last_panel: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn bounds(&self) -> Size<f32> {
        (self.size.width as f32, self.size.height as f32).into()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>, data: &mut ApplicationData) -> bool {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.size = new_size;
            data.bounds = self.bounds();

            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                (new_size.width, new_size.height),
                "depth texture",
            );
            self.renderers.bloom.resize(&self.device, new_size.into());
            self.renderers.text.resize(&self.queue, new_size.into());
            true
        } else {
            log::info!("Resize with 0,0 size...");
            false
        }
    }

    /// Per-frame state upload: scene uniforms, bloom parameters, and the
    /// info panel when the selection changed.
    pub fn update(&mut self, data: &mut ApplicationData) {
        data.uniforms = GlobeUniforms::new(
            &data.camera,
            data.bounds,
            data.sun_direction,
            &data.settings,
        );
        if data.settings.debug {
            log::debug!("sun direction: {}", data.sun_direction);
        }

        self.queue.write_buffer(
            &self.renderers.scene_uniforms.buffer,
            0,
            bytemuck::bytes_of(&data.uniforms),
        );
        self.renderers
            .bloom
            .update(&self.queue, &data.bloom, data.bounds);

        let panel = data.selection.panel();
        if self.last_panel != Some(panel) {
            self.last_panel = Some(panel);
            self.renderers
                .text
                .set_panel(panel.and_then(|index| data.locations.get(index)));
            self.renderers.text.prepare(&self.device, &self.queue);
        }
    }

    pub fn set_earth_textures(&mut self, textures: &EarthTextures) {
        self.renderers
            .earth
            .set_textures(&self.device, &self.queue, textures);
    }

    /// Rebuilds marker GPU state after the scene or the model changed.
    pub fn rebuild_markers(&mut self, data: &ApplicationData) {
        self.renderers
            .markers
            .set_model(&self.device, data.marker_model.as_ref());
        self.renderers
            .markers
            .set_instances(&self.device, &data.marker_scene);
    }

    /// Refreshes only the instance buffers, e.g. after a bloom toggle.
    pub fn refresh_marker_instances(&mut self, data: &ApplicationData) {
        self.renderers
            .markers
            .set_instances(&self.device, &data.marker_scene);
    }

    fn depth_attachment(&self) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
        Some(wgpu::RenderPassDepthStencilAttachment {
            view: self.depth_texture.get_view(),
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        })
    }

    pub fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.config.format),
            ..Default::default()
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Phase one: bloom sources only. The earth draws black here so it
        // still occludes markers on the far side.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bloom.source"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.renderers.bloom.source_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: self.depth_attachment(),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_bind_group(0, &self.renderers.scene_uniforms.bind_group, &[]);
            self.renderers.earth.render_dark(&mut pass);
            self.renderers.markers.render_bloom_sources(&mut pass);
        }

        self.renderers.bloom.blur(&mut encoder);

        // Phase two: the full scene.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.renderers.bloom.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: self.depth_attachment(),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_bind_group(0, &self.renderers.scene_uniforms.bind_group, &[]);
            self.renderers.stars.render(&mut pass);
            self.renderers.earth.render(&mut pass);
            self.renderers.markers.render(&mut pass);
            self.renderers.atmosphere.render(&mut pass);
        }

        self.renderers.bloom.composite(&mut encoder, &view);

        // Info panel on top of the composited frame.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("text.overlay"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.renderers.text.render(&mut pass);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();

        Ok(())
    }
}
