use color_eyre::Result;
use wgpu::{Sampler, TextureView};

/// A decoded RGBA8 image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// The two surface maps of the globe.
#[derive(Debug, Clone)]
pub struct EarthTextures {
    pub day: DecodedTexture,
    pub bump: DecodedTexture,
}

impl EarthTextures {
    /// The look of the globe before (or without) real textures: a blue
    /// placeholder day map over a flat bump map.
    pub fn placeholders() -> Self {
        Self {
            day: placeholder_texture([0x1a, 0x4f, 0x9c]),
            bump: placeholder_texture([0x55, 0x55, 0x55]),
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedTexture> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedTexture {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// A generated stand-in texture: solid color with a faint grid, so a failed
/// load is visible but never fatal.
pub fn placeholder_texture(color: [u8; 3]) -> DecodedTexture {
    const WIDTH: u32 = 1024;
    const HEIGHT: u32 = 512;
    const GRID: u32 = 64;

    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT * 4) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let on_grid = x % GRID == 0 || y % GRID == 0;
            for channel in color {
                let value = if on_grid {
                    // Faint white line over the base color.
                    (channel as u32 * 7 / 10 + 255 * 3 / 10) as u8
                } else {
                    channel
                };
                pixels.push(value);
            }
            pixels.push(0xff);
        }
    }

    DecodedTexture {
        width: WIDTH,
        height: HEIGHT,
        pixels,
    }
}

pub struct Texture {
    texture: wgpu::Texture,
    view: TextureView,
    sampler: Option<Sampler>,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn get_texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn get_view(&self) -> &TextureView {
        &self.view
    }

    pub fn get_sampler(&self) -> &Option<Sampler> {
        &self.sampler
    }

    pub fn create_render_texture(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        (width, height): (u32, u32),
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(format),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler: Some(sampler),
        }
    }

    pub fn create_depth_texture(
        device: &wgpu::Device,
        (width, height): (u32, u32),
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Uploads a decoded image as a sampled color texture.
    pub fn create_image_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedTexture,
        srgb: bool,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler: Some(sampler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_has_full_coverage_and_opaque_alpha() {
        let texture = placeholder_texture([0x1a, 0x4f, 0x9c]);
        assert_eq!(
            texture.pixels.len(),
            (texture.width * texture.height * 4) as usize
        );
        assert!(texture.pixels.chunks(4).all(|px| px[3] == 0xff));
    }

    #[test]
    fn placeholder_grid_lines_differ_from_the_base_color() {
        let texture = placeholder_texture([0x10, 0x20, 0x30]);
        let base = &texture.pixels[(texture.width as usize * 4) + 4 * 33..][..3];
        let on_line = &texture.pixels[0..3];
        assert_ne!(base, on_line);
    }
}
