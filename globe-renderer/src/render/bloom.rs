use crate::data::Size;

use super::{
    data::{BloomSettings, BlurUniforms, CompositeUniforms},
    pipeline::{
        Pipeline, create_texture_bind_group, create_texture_bind_group_layout,
        create_uniform_bind_group,
    },
    texture::Texture,
};

/// The selective-bloom post chain.
///
/// Phase one renders bloom sources (with the rest of the scene substituted
/// dark) into `source`; the threshold-extracting horizontal blur writes
/// `blur_a`, the vertical blur writes `blur_b`. Phase two renders the full
/// scene into `scene`, and the composite pass adds the blurred glow on top
/// while writing to the swapchain.
pub struct BloomRenderer {
    format: wgpu::TextureFormat,
    target_size: Size<u32>,
    source: Texture,
    blur_a: Texture,
    blur_b: Texture,
    scene: Texture,
    texture_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    source_bind_group: wgpu::BindGroup,
    blur_a_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
    horizontal: Pipeline,
    vertical: Pipeline,
    composite: Pipeline,
}

impl BloomRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        target_size: Size<u32>,
    ) -> Self {
        let texture_layout = create_texture_bind_group_layout(device, 1, "bloom input layout");
        let composite_layout =
            create_texture_bind_group_layout(device, 2, "bloom composite layout");

        let blur_shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/bloom_blur.wgsl"
        )));
        let composite_shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/bloom_composite.wgsl"
        )));

        let horizontal = Self::create_fullscreen_pipeline(
            device,
            format,
            &blur_shader,
            &[&texture_layout],
            std::mem::size_of::<BlurUniforms>() as u64,
            "bloom horizontal blur",
        );
        let vertical = Self::create_fullscreen_pipeline(
            device,
            format,
            &blur_shader,
            &[&texture_layout],
            std::mem::size_of::<BlurUniforms>() as u64,
            "bloom vertical blur",
        );
        let composite = Self::create_fullscreen_pipeline(
            device,
            format,
            &composite_shader,
            &[&composite_layout],
            std::mem::size_of::<CompositeUniforms>() as u64,
            "bloom composite",
        );

        let (source, blur_a, blur_b, scene) = Self::create_targets(device, format, target_size);
        let source_bind_group =
            create_texture_bind_group(device, &texture_layout, &[&source], "bloom source input");
        let blur_a_bind_group =
            create_texture_bind_group(device, &texture_layout, &[&blur_a], "bloom blur input");
        let composite_bind_group = create_texture_bind_group(
            device,
            &composite_layout,
            &[&scene, &blur_b],
            "bloom composite input",
        );

        Self {
            format,
            target_size,
            source,
            blur_a,
            blur_b,
            scene,
            texture_layout,
            composite_layout,
            source_bind_group,
            blur_a_bind_group,
            composite_bind_group,
            horizontal,
            vertical,
            composite,
        }
    }

    fn create_fullscreen_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        shader: &wgpu::ShaderModule,
        texture_layouts: &[&wgpu::BindGroupLayout],
        uniform_size: u64,
        label: &str,
    ) -> Pipeline {
        let (uniforms, uniform_layout, uniform_bind_group) =
            create_uniform_bind_group(device, uniform_size, label);

        let mut bind_group_layouts: Vec<&wgpu::BindGroupLayout> = texture_layouts.to_vec();
        bind_group_layouts.push(&uniform_layout);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Pipeline::new(pipeline, uniforms, uniform_bind_group)
    }

    fn create_targets(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size<u32>,
    ) -> (Texture, Texture, Texture, Texture) {
        let dims = (size.width.max(1), size.height.max(1));
        (
            Texture::create_render_texture(device, format, dims, "bloom source"),
            Texture::create_render_texture(device, format, dims, "bloom blur a"),
            Texture::create_render_texture(device, format, dims, "bloom blur b"),
            Texture::create_render_texture(device, format, dims, "scene color"),
        )
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: Size<u32>) {
        if size == self.target_size {
            return;
        }
        self.target_size = size;
        let (source, blur_a, blur_b, scene) = Self::create_targets(device, self.format, size);
        self.source = source;
        self.blur_a = blur_a;
        self.blur_b = blur_b;
        self.scene = scene;
        self.source_bind_group = create_texture_bind_group(
            device,
            &self.texture_layout,
            &[&self.source],
            "bloom source input",
        );
        self.blur_a_bind_group = create_texture_bind_group(
            device,
            &self.texture_layout,
            &[&self.blur_a],
            "bloom blur input",
        );
        self.composite_bind_group = create_texture_bind_group(
            device,
            &self.composite_layout,
            &[&self.scene, &self.blur_b],
            "bloom composite input",
        );
    }

    pub fn update(&self, queue: &wgpu::Queue, settings: &BloomSettings, bounds: Size<f32>) {
        queue.write_buffer(
            self.horizontal.get_uniforms(),
            0,
            bytemuck::bytes_of(&BlurUniforms::new((1.0, 0.0), bounds, settings)),
        );
        queue.write_buffer(
            self.vertical.get_uniforms(),
            0,
            bytemuck::bytes_of(&BlurUniforms::new((0.0, 1.0), bounds, settings)),
        );
        queue.write_buffer(
            self.composite.get_uniforms(),
            0,
            bytemuck::bytes_of(&CompositeUniforms::new(settings)),
        );
    }

    pub fn source_view(&self) -> &wgpu::TextureView {
        self.source.get_view()
    }

    pub fn scene_view(&self) -> &wgpu::TextureView {
        self.scene.get_view()
    }

    /// Runs the two blur passes over the bloom source.
    pub fn blur(&self, encoder: &mut wgpu::CommandEncoder) {
        for (label, pipeline, input, output) in [
            (
                "bloom.blur.horizontal",
                &self.horizontal,
                &self.source_bind_group,
                self.blur_a.get_view(),
            ),
            (
                "bloom.blur.vertical",
                &self.vertical,
                &self.blur_a_bind_group,
                self.blur_b.get_view(),
            ),
        ] {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(pipeline.get_pipeline());
            pass.set_bind_group(0, input, &[]);
            pass.set_bind_group(1, pipeline.get_uniform_bind_group(), &[]);
            pass.draw(0..6, 0..1);
        }
    }

    /// Adds the blurred glow over the scene color, writing the swapchain.
    pub fn composite(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("bloom.composite"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(self.composite.get_pipeline());
        pass.set_bind_group(0, &self.composite_bind_group, &[]);
        pass.set_bind_group(1, self.composite.get_uniform_bind_group(), &[]);
        pass.draw(0..6, 0..1);
    }
}
