use glam::Vec2;

use crate::assets::{AssetHandle, Assets, Font};
use crate::renderer::{Color, Material, Quad, Renderer};

/// Single line of text laid out with a bitmap font.
///
/// Characters missing from the font use its unknown-character glyph.
#[derive(Debug, Clone)]
pub struct Text {
    font: AssetHandle<Font>,
    text: String,
    pos: Vec2,
    color: Color,
}

impl Text {
    pub fn new(assets: &Assets, font: AssetHandle<Font>) -> Option<Self> {
        if !assets.is_alive(font) {
            log::error!("Attempt to create text with invalid font");
            return None;
        }
        Some(Self {
            font,
            text: String::new(),
            pos: Vec2::ZERO,
            color: Color::WHITE,
        })
    }

    pub fn font(&self) -> AssetHandle<Font> {
        self.font
    }

    pub fn set_font(&mut self, assets: &Assets, font: AssetHandle<Font>) {
        if !assets.is_alive(font) {
            log::error!("Attempt to set invalid font to text");
            return;
        }
        self.font = font;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Pen start: left end of the baseline.
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Width of the laid out line in points, 0 if the font is gone.
    pub fn width(&self, assets: &Assets) -> f32 {
        assets.get(self.font).map_or(0.0, |font| font.text_width(&self.text))
    }

    /// One quad per character.
    pub fn layout(&self, font: &Font) -> Vec<Quad> {
        let scale = font.scale();
        let mut pen = self.pos;
        self.text
            .chars()
            .map(|c| {
                let glyph = font.glyph(c);
                let size = Vec2::new(glyph.width, glyph.height) * scale;
                let quad = Quad::rect(pen + glyph.offset * scale, size, glyph.uv);
                pen.x += size.x;
                quad
            })
            .collect()
    }

    pub fn render(&self, renderer: &mut Renderer, assets: &Assets) -> bool {
        let Some(font) = assets.get(self.font) else {
            log::error!("Attempt to render text with invalid font");
            return false;
        };
        let material = Material::textured(font.texture());
        self.layout(font)
            .iter()
            .all(|quad| renderer.render_quad(assets, &material, quad, self.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::files::{FileLocation, MemoryFileSystem};
    use crate::platform::image::{ColorFormat, Image, ImageCodec, RawCodec};
    use crate::renderer::{Camera, HeadlessBackend, UvRect};

    const FONT: &str = r#"{
        "size": 8,
        "unknown": {"x": 0, "y": 0, "width": 4, "height": 8},
        "glyphs": {
            "A": {"x": 4, "y": 0, "width": 6, "height": 8},
            "B": {"x": 10, "y": 0, "width": 5, "height": 8, "offsetX": 1, "offsetY": -2}
        }
    }"#;

    fn setup() -> (Renderer, Assets, AssetHandle<Font>) {
        let mut renderer = Renderer::new(
            Box::new(HeadlessBackend::new()),
            Camera::new(100.0, 100.0, Vec2::splat(100.0)),
        );
        let image = RawCodec
            .encode(&Image::new(16, 8, ColorFormat::Rgba))
            .unwrap_or_default();
        let mut files = MemoryFileSystem::new();
        files.insert("fonts/main.png", image, FileLocation::Assets);
        files.insert("fonts/main.font", FONT, FileLocation::Assets);
        let mut assets = Assets::new(Box::new(files), Box::new(RawCodec), "", 0.5);
        assets.load_all(renderer.backend_mut());
        let font = assets.get_asset_by_path::<Font>("fonts/main");
        (renderer, assets, font)
    }

    #[test]
    fn glyphs_advance_by_width() {
        let (_, assets, font) = setup();
        let Some(mut text) = Text::new(&assets, font) else {
            panic!("font not loaded");
        };
        text.set_text("AB?");
        text.set_pos(Vec2::new(10.0, 20.0));
        let Some(f) = assets.get(font) else {
            panic!("font not loaded");
        };
        let quads = text.layout(f);
        assert_eq!(quads.len(), 3);
        assert_eq!(quads[0].bottom_left, Vec2::new(10.0, 20.0));
        assert_eq!(quads[0].top_right, Vec2::new(13.0, 24.0));
        assert_eq!(quads[1].bottom_left, Vec2::new(13.5, 19.0));
        assert_eq!(quads[2].bottom_left, Vec2::new(15.5, 20.0));
        assert_eq!(quads[2].uv, UvRect::new(0.0, 0.0, 0.25, 1.0));
        assert_eq!(text.width(&assets), 7.5);
    }

    #[test]
    fn renders_one_batch() {
        let (mut renderer, assets, font) = setup();
        let Some(mut text) = Text::new(&assets, font) else {
            panic!("font not loaded");
        };
        text.set_text("ABBA");
        renderer.begin_render();
        assert!(text.render(&mut renderer, &assets));
        renderer.end_render();
        assert_eq!(renderer.stats().render_calls, 1);
        assert_eq!(renderer.stats().rendered_vertices, 24);
    }
}
