use glam::{Mat4, Vec3, Vec4};

use crate::{config::GlobeSettings, data::Size, data::camera::OrbitCamera};

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GlobeUniforms {
    camera_proj: Mat4,
    normal_proj: Mat4,
    camera_pos: Vec4,
    /// Unit vector from the sun toward the globe center.
    sun_direction: Vec4,
    /// x: ambient floor, y: emission intensity, z: bump scale,
    /// w: sun intensity.
    params: Vec4,
}

impl GlobeUniforms {
    pub fn new(
        camera: &OrbitCamera,
        bounds: Size<f32>,
        sun_direction: Vec3,
        settings: &GlobeSettings,
    ) -> Self {
        Self {
            camera_proj: camera.build_view_proj_matrix(bounds.width, bounds.height),
            normal_proj: camera.build_view_normal_matrix(),
            camera_pos: camera.position(),
            sun_direction: Vec4::from((sun_direction, 0.0)),
            params: Vec4::new(
                settings.ambient_floor,
                settings.emission_intensity,
                settings.bump_scale,
                settings.sun_intensity,
            ),
        }
    }
}

/// Runtime-adjustable bloom parameters. Defaults match the tuned values of
/// the original composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 0.3,
            radius: 0.1,
            threshold: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BlurUniforms {
    /// (1, 0) for the horizontal pass, (0, 1) for the vertical one.
    direction: [f32; 2],
    texel: [f32; 2],
    radius: f32,
    threshold: f32,
    _padding: [f32; 2],
}

impl BlurUniforms {
    pub fn new(direction: (f32, f32), bounds: Size<f32>, settings: &BloomSettings) -> Self {
        Self {
            direction: [direction.0, direction.1],
            texel: [1.0 / bounds.width.max(1.0), 1.0 / bounds.height.max(1.0)],
            radius: settings.radius,
            threshold: settings.threshold,
            _padding: [0.0; 2],
        }
    }
}

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct CompositeUniforms {
    strength: f32,
    _padding: [f32; 3],
}

impl CompositeUniforms {
    pub fn new(settings: &BloomSettings) -> Self {
        Self {
            strength: settings.strength,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    pub position: [f32; 3],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
        0 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-marker placement, a column-major model matrix.
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct MarkerInstance {
    pub model: [[f32; 4]; 4],
}

impl MarkerInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
    ];

    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct StarInstance {
    pub position: [f32; 3],
    pub size: f32,
}

impl StarInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}
