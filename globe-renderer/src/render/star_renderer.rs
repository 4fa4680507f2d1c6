use wgpu::util::DeviceExt;

use super::{
    data::StarInstance,
    geometry::{STAR_COUNT, STAR_DISTANCE, star_field},
    pipeline::{additive_blend_state, overlay_depth_stencil_state},
};

/// Point stars billboarded in the vertex shader, far behind the globe.
pub struct StarRenderer {
    instances: wgpu::Buffer,
    instance_count: u32,
    pipeline: wgpu::RenderPipeline,
}

impl StarRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_uniform_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let stars = star_field(STAR_COUNT, STAR_DISTANCE);
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star instances"),
            contents: bytemuck::cast_slice(&stars),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Star Pipeline Layout"),
            bind_group_layouts: &[scene_uniform_layout],
            immediate_size: 0,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/stars.wgsl"
        )));

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Star Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StarInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
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
            instances,
            instance_count: STAR_COUNT as u32,
            pipeline,
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.instances.slice(..));
        // Six vertices per star quad, expanded in the vertex shader.
        pass.draw(0..6, 0..self.instance_count);
    }
}
