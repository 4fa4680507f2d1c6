use crate::data::Size;

use super::{
    atmosphere_renderer::AtmosphereRenderer,
    bloom::BloomRenderer,
    data::GlobeUniforms,
    earth_renderer::EarthRenderer,
    marker_renderer::MarkerRenderer,
    pipeline::create_uniform_bind_group,
    star_renderer::StarRenderer,
    text::TextState,
};

/// The shared scene uniforms every world-space pipeline binds at group 0.
pub struct SceneUniformBinding {
    pub buffer: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl SceneUniformBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let (buffer, layout, bind_group) = create_uniform_bind_group(
            device,
            std::mem::size_of::<GlobeUniforms>() as u64,
            "scene uniforms",
        );
        Self {
            buffer,
            layout,
            bind_group,
        }
    }
}

pub struct ApplicationRenderers {
    pub scene_uniforms: SceneUniformBinding,
    pub earth: EarthRenderer,
    pub atmosphere: AtmosphereRenderer,
    pub stars: StarRenderer,
    pub markers: MarkerRenderer,
    pub bloom: BloomRenderer,
    pub text: TextState,
}

impl ApplicationRenderers {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        target_size: Size<u32>,
    ) -> Self {
        let scene_uniforms = SceneUniformBinding::new(device);

        let earth = EarthRenderer::new(device, queue, format, &scene_uniforms.layout);
        let atmosphere = AtmosphereRenderer::new(device, format, &scene_uniforms.layout);
        let stars = StarRenderer::new(device, format, &scene_uniforms.layout);
        let markers = MarkerRenderer::new(device, format, &scene_uniforms.layout);
        let bloom = BloomRenderer::new(device, format, target_size);
        let text = TextState::new(device, queue, format);

        Self {
            scene_uniforms,
            earth,
            atmosphere,
            stars,
            markers,
            bloom,
            text,
        }
    }
}
