use glyphon::{
    Attrs, Buffer, Cache, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache, TextArea,
    TextAtlas, TextBounds, TextRenderer, Viewport,
};
use globe_common::Location;
use std::cell::RefCell;
use wgpu::MultisampleState;

use crate::data::Size;

pub const PANEL_MARGIN: f32 = 16.0;
pub const PANEL_WIDTH: f32 = 340.0;
pub const PANEL_HEIGHT: f32 = 160.0;
const FONT_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 20.0;

thread_local! {
    pub static FONT_SYSTEM: RefCell<FontSystem> = RefCell::new(FontSystem::new());
}

/// The info-panel text block for a location.
pub fn panel_text(location: &Location) -> String {
    format!(
        "{}\n{}, {}\n{}\n{:.4}, {:.4}",
        location.point_name,
        location.city,
        location.country,
        location.description,
        location.latitude,
        location.longitude,
    )
}

/// Renders the info panel as a text overlay in the corner of the viewport.
/// The panel is prepared only when the selection changes and skipped
/// entirely while hidden.
pub struct TextState {
    swash_cache: SwashCache,
    pub viewport: Viewport,
    atlas: TextAtlas,
    text_renderer: TextRenderer,
    panel: Option<Buffer>,
}

impl TextState {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> Self {
        let swash_cache = SwashCache::new();
        let cache = Cache::new(device);
        let viewport = Viewport::new(device, &cache);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let text_renderer =
            TextRenderer::new(&mut atlas, device, MultisampleState::default(), None);

        Self {
            swash_cache,
            viewport,
            atlas,
            text_renderer,
            panel: None,
        }
    }

    pub fn set_panel(&mut self, location: Option<&Location>) {
        self.panel = location.map(|location| {
            FONT_SYSTEM.with_borrow_mut(|font_system| {
                let mut buffer = Buffer::new(font_system, Metrics::new(FONT_SIZE, LINE_HEIGHT));
                buffer.set_size(font_system, Some(PANEL_WIDTH), Some(PANEL_HEIGHT));
                buffer.set_text(
                    font_system,
                    &panel_text(location),
                    &Attrs::new().family(Family::SansSerif),
                    Shaping::Advanced,
                    None,
                );
                buffer.shape_until_scroll(font_system, false);
                buffer
            })
        });
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, size: Size<u32>) {
        self.viewport.update(
            queue,
            Resolution {
                width: size.width,
                height: size.height,
            },
        );
    }

    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let Some(panel) = &self.panel else {
            return;
        };

        let text_areas = [TextArea {
            buffer: panel,
            left: PANEL_MARGIN,
            top: PANEL_MARGIN,
            scale: 1.0,
            bounds: TextBounds {
                left: PANEL_MARGIN as i32,
                top: PANEL_MARGIN as i32,
                right: (PANEL_MARGIN + PANEL_WIDTH) as i32,
                bottom: (PANEL_MARGIN + PANEL_HEIGHT) as i32,
            },
            default_color: glyphon::Color::rgb(0xff, 0xff, 0xff),
            custom_glyphs: &[],
        }];

        FONT_SYSTEM.with_borrow_mut(|font_system| {
            if let Err(err) = self.text_renderer.prepare(
                device,
                queue,
                font_system,
                &mut self.atlas,
                &self.viewport,
                text_areas,
                &mut self.swash_cache,
            ) {
                log::error!("info panel prepare failed: {err}");
            }
        });
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.panel.is_none() {
            return;
        }
        if let Err(err) = self
            .text_renderer
            .render(&self.atlas, &self.viewport, pass)
        {
            log::error!("info panel render failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_text_lists_name_place_description_and_coordinates() {
        let location = Location {
            country: "United Kingdom".into(),
            city: "London".into(),
            point_name: "London Capital".into(),
            description: "Capital city of the United Kingdom".into(),
            latitude: 51.5074,
            longitude: -0.1278,
            date_added: "2025-05-18T00:00:00Z".parse().unwrap(),
        };
        let text = panel_text(&location);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "London Capital");
        assert_eq!(lines[1], "London, United Kingdom");
        assert_eq!(lines[3], "51.5074, -0.1278");
    }
}
