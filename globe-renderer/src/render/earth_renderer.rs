use wgpu::util::DeviceExt;

use crate::common::geo::GLOBE_RADIUS;

use super::{
    data::SphereVertex,
    geometry::{SPHERE_SEGMENTS, uv_sphere},
    pipeline::{
        create_texture_bind_group, create_texture_bind_group_layout, scene_depth_stencil_state,
    },
    texture::{EarthTextures, Texture},
};

/// Draws the textured earth sphere with the day/night terminator shader.
///
/// Two fragment entry points share one module: the lit one for the scene
/// pass and a black one used when the sphere only occludes bloom sources.
/// Swapping pipelines per pass is the whole "material substitution" — there
/// is nothing to restore afterwards.
pub struct EarthRenderer {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    dark_pipeline: wgpu::RenderPipeline,
}

impl EarthRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        scene_uniform_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let (vertex_data, index_data) =
            uv_sphere(GLOBE_RADIUS, SPHERE_SEGMENTS, SPHERE_SEGMENTS);

        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("earth vertices"),
            contents: bytemuck::cast_slice(&vertex_data),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("earth indices"),
            contents: bytemuck::cast_slice(&index_data),
            usage: wgpu::BufferUsages::INDEX,
        });

        let texture_bind_group_layout =
            create_texture_bind_group_layout(device, 2, "earth textures layout");
        let texture_bind_group = Self::upload(
            device,
            queue,
            &texture_bind_group_layout,
            &EarthTextures::placeholders(),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Earth Pipeline Layout"),
            bind_group_layouts: &[scene_uniform_layout, &texture_bind_group_layout],
            immediate_size: 0,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/earth.wgsl"
        )));

        let create_pipeline = |entry_point: &str, label: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[SphereVertex::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: scene_depth_stencil_state(),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let pipeline = create_pipeline("fs_main", "Earth Pipeline");
        let dark_pipeline = create_pipeline("fs_dark", "Earth Occluder Pipeline");

        Self {
            vertices,
            indices,
            index_count: index_data.len() as u32,
            texture_bind_group_layout,
            texture_bind_group,
            pipeline,
            dark_pipeline,
        }
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        textures: &EarthTextures,
    ) -> wgpu::BindGroup {
        let day = Texture::create_image_texture(device, queue, &textures.day, true, "earth day");
        let bump =
            Texture::create_image_texture(device, queue, &textures.bump, false, "earth bump");
        create_texture_bind_group(device, layout, &[&day, &bump], "earth textures")
    }

    pub fn set_textures(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &EarthTextures,
    ) {
        self.texture_bind_group =
            Self::upload(device, queue, &self.texture_bind_group_layout, textures);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw(pass, &self.pipeline);
    }

    /// Occluder-only variant for the bloom source pass.
    pub fn render_dark(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw(pass, &self.dark_pipeline);
    }
}
