use wgpu::util::DeviceExt;

use crate::common::geo::GLOBE_RADIUS;

use super::{
    data::SphereVertex,
    geometry::{SPHERE_SEGMENTS, uv_sphere},
    pipeline::{additive_blend_state, overlay_depth_stencil_state},
};

/// The glow shell sits a little outside the surface.
pub const ATMOSPHERE_SCALE: f32 = 1.08;

/// Additively blended back-face shell producing the rim glow around the
/// globe. Drawing the inside of the shell makes the glow strongest where
/// the surface curves away from the viewer.
pub struct AtmosphereRenderer {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    pipeline: wgpu::RenderPipeline,
}

impl AtmosphereRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_uniform_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let (vertex_data, index_data) = uv_sphere(
            GLOBE_RADIUS * ATMOSPHERE_SCALE,
            SPHERE_SEGMENTS,
            SPHERE_SEGMENTS,
        );

        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("atmosphere vertices"),
            contents: bytemuck::cast_slice(&vertex_data),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("atmosphere indices"),
            contents: bytemuck::cast_slice(&index_data),
            usage: wgpu::BufferUsages::INDEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Atmosphere Pipeline Layout"),
            bind_group_layouts: &[scene_uniform_layout],
            immediate_size: 0,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/atmosphere.wgsl"
        )));

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Atmosphere Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[SphereVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                front_face: wgpu::FrontFace::Ccw,
                // Back side only.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: overlay_depth_stencil_state(),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive_blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            vertices,
            indices,
            index_count: index_data.len() as u32,
            pipeline,
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
