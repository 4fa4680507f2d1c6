use wgpu::util::DeviceExt;

use crate::data::markers::{MARKER_HEIGHT, MARKER_SIZE, MarkerModel, MarkerScene};

use super::{
    data::{MarkerInstance, MeshVertex},
    geometry::cone,
    pipeline::scene_depth_stencil_state,
};

const CONE_SEGMENTS: u32 = 8;

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, vertices: &[MeshVertex], indices: &[u32], label: &str) -> Self {
        Self {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: indices.len() as u32,
        }
    }
}

/// Draws one instance of the marker shape per location. The shape is the
/// primitive cone unless a custom model has been installed; either way the
/// per-location placement comes from the marker scene.
pub struct MarkerRenderer {
    meshes: Vec<GpuMesh>,
    all_instances: Option<wgpu::Buffer>,
    all_count: u32,
    bloom_instances: Option<wgpu::Buffer>,
    bloom_count: u32,
    pipeline: wgpu::RenderPipeline,
}

impl MarkerRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_uniform_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let (cone_vertices, cone_indices) = cone(MARKER_SIZE, MARKER_HEIGHT, CONE_SEGMENTS);
        let meshes = vec![GpuMesh::new(
            device,
            &cone_vertices,
            &cone_indices,
            "marker cone",
        )];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Marker Pipeline Layout"),
            bind_group_layouts: &[scene_uniform_layout],
            immediate_size: 0,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/shaders/markers.wgsl"
        )));

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Marker Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::desc(), MarkerInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
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

        Self {
            meshes,
            all_instances: None,
            all_count: 0,
            bloom_instances: None,
            bloom_count: 0,
            pipeline,
        }
    }

    /// Replaces the marker shape with a custom model, or restores the cone.
    pub fn set_model(&mut self, device: &wgpu::Device, model: Option<&MarkerModel>) {
        self.meshes = match model {
            Some(model) => model
                .meshes
                .iter()
                .map(|mesh| {
                    let vertices: Vec<MeshVertex> = mesh
                        .vertices
                        .iter()
                        .map(|v| MeshVertex {
                            position: v.to_array(),
                        })
                        .collect();
                    GpuMesh::new(device, &vertices, &mesh.indices, "marker model mesh")
                })
                .collect(),
            None => {
                let (cone_vertices, cone_indices) = cone(MARKER_SIZE, MARKER_HEIGHT, CONE_SEGMENTS);
                vec![GpuMesh::new(
                    device,
                    &cone_vertices,
                    &cone_indices,
                    "marker cone",
                )]
            }
        };
    }

    /// Rebuilds the instance buffers from the marker scene, including the
    /// bloom-only subset.
    pub fn set_instances(&mut self, device: &wgpu::Device, scene: &MarkerScene) {
        let all: Vec<MarkerInstance> = scene
            .markers()
            .iter()
            .map(|marker| MarkerInstance::new(marker.transform))
            .collect();
        let bloom: Vec<MarkerInstance> = scene
            .markers()
            .iter()
            .filter(|marker| marker.bloom)
            .map(|marker| MarkerInstance::new(marker.transform))
            .collect();

        self.all_count = all.len() as u32;
        self.all_instances = (!all.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("marker instances"),
                contents: bytemuck::cast_slice(&all),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        self.bloom_count = bloom.len() as u32;
        self.bloom_instances = (!bloom.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("marker bloom instances"),
                contents: bytemuck::cast_slice(&bloom),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: &wgpu::Buffer, count: u32) {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(1, instances.slice(..));
        for mesh in &self.meshes {
            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..count);
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(instances) = &self.all_instances {
            self.draw(pass, instances, self.all_count);
        }
    }

    /// Only the markers opted into the bloom layer, for the source pass.
    pub fn render_bloom_sources(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(instances) = &self.bloom_instances {
            self.draw(pass, instances, self.bloom_count);
        }
    }
}
