use glam::Vec2;

use crate::assets::{AssetHandle, Assets, Texture, TextureRegion};
use crate::renderer::{BlendMode, Color, Material, Quad, Renderer, UvRect};

/// Textured rectangle with position, size, origin, scale, rotation and tint.
///
/// Position is where the origin lands in content space; the origin is in
/// sprite-local points from the bottom-left corner. Size defaults to the
/// source's size in points.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    material: Material,
    uv: UvRect,
    pos: Vec2,
    size: Vec2,
    origin: Vec2,
    scale: Vec2,
    /// Degrees, counter-clockwise.
    angle: f32,
    color: Color,
}

impl Sprite {
    /// Sprite showing the whole of `texture`. `None` if the texture is gone.
    pub fn from_texture(assets: &Assets, texture: AssetHandle<Texture>) -> Option<Self> {
        let Some(t) = assets.get(texture) else {
            log::error!("Attempt to create sprite from invalid texture");
            return None;
        };
        Some(Self::new(
            texture,
            UvRect::FULL,
            Vec2::new(t.width_points(), t.height_points()),
        ))
    }

    /// Sprite showing `region`. `None` if the region or its texture is gone.
    pub fn from_region(assets: &Assets, region: AssetHandle<TextureRegion>) -> Option<Self> {
        let Some(r) = assets.get(region).filter(|r| assets.is_alive(r.texture())) else {
            log::error!("Attempt to create sprite from invalid texture region");
            return None;
        };
        Some(Self::new(
            r.texture(),
            r.uv(),
            Vec2::new(r.width_points(), r.height_points()),
        ))
    }

    /// Sprite from the asset at `path`, a region or a texture.
    pub fn from_path(assets: &Assets, path: &str) -> Option<Self> {
        let region = assets.get_asset_by_path::<TextureRegion>(path);
        if assets.is_alive(region) {
            return Self::from_region(assets, region);
        }
        let texture = assets.get_asset_by_path::<Texture>(path);
        if assets.is_alive(texture) {
            return Self::from_texture(assets, texture);
        }
        log::error!("Attempt to create sprite from invalid asset \"{path}\"");
        None
    }

    fn new(texture: AssetHandle<Texture>, uv: UvRect, size: Vec2) -> Self {
        Self {
            material: Material::textured(texture),
            uv,
            pos: Vec2::ZERO,
            size,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            angle: 0.0,
            color: Color::WHITE,
        }
    }

    /// Show the whole of `texture`. Size is kept.
    pub fn set_texture(&mut self, assets: &Assets, texture: AssetHandle<Texture>) {
        if !assets.is_alive(texture) {
            log::error!("Attempt to set invalid texture to sprite");
            return;
        }
        self.material.texture = Some(texture);
        self.uv = UvRect::FULL;
    }

    /// Show `region`. Size is kept.
    pub fn set_region(&mut self, assets: &Assets, region: AssetHandle<TextureRegion>) {
        match assets.get(region).filter(|r| assets.is_alive(r.texture())) {
            Some(r) => {
                self.material.texture = Some(r.texture());
                self.uv = r.uv();
            }
            None => log::error!("Attempt to set invalid texture region to sprite"),
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn uv(&self) -> UvRect {
        self.uv
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        if !size.is_finite() || size.min_element() < 0.0 {
            log::error!("Sprite size must be finite and non-negative, got {size}");
            return;
        }
        self.size = size;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn set_origin_to_center(&mut self) {
        self.origin = self.size / 2.0;
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        if !scale.is_finite() || scale.min_element() < 0.0 {
            log::error!("Sprite scale must be finite and non-negative, got {scale}");
            return;
        }
        self.scale = scale;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = degrees;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Tint; the sprite's alpha is kept.
    pub fn set_color(&mut self, color: Color) {
        self.color = color.with_alpha(self.color.a);
    }

    pub fn alpha(&self) -> f32 {
        self.color.a
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.color.a = alpha;
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        self.material.blend = blend;
    }

    /// Corner positions in content space.
    pub fn quad(&self) -> Quad {
        let scaled = self.size * self.scale;
        let local = Quad::rect(-self.origin * self.scale, scaled, self.uv);
        if self.angle == 0.0 {
            return translate(local, self.pos);
        }
        let rotation = Vec2::from_angle(self.angle.to_radians());
        translate(
            Quad {
                bottom_left: rotation.rotate(local.bottom_left),
                top_left: rotation.rotate(local.top_left),
                top_right: rotation.rotate(local.top_right),
                bottom_right: rotation.rotate(local.bottom_right),
                uv: local.uv,
            },
            self.pos,
        )
    }

    pub fn render(&self, renderer: &mut Renderer, assets: &Assets) -> bool {
        renderer.render_quad(assets, &self.material, &self.quad(), self.color)
    }
}

fn translate(quad: Quad, offset: Vec2) -> Quad {
    Quad {
        bottom_left: quad.bottom_left + offset,
        top_left: quad.top_left + offset,
        top_right: quad.top_right + offset,
        bottom_right: quad.bottom_right + offset,
        uv: quad.uv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::files::{FileLocation, MemoryFileSystem};
    use crate::platform::image::{ColorFormat, Image, ImageCodec, RawCodec};
    use crate::renderer::{Camera, HeadlessBackend, HeadlessProbe};

    fn setup() -> (Renderer, Assets, HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let mut renderer = Renderer::new(Box::new(backend), Camera::new(100.0, 100.0, Vec2::splat(100.0)));
        let image = RawCodec
            .encode(&Image::new(32, 16, ColorFormat::Rgba))
            .unwrap_or_default();
        let mut files = MemoryFileSystem::new();
        files.insert("hero.png", image.clone(), FileLocation::Assets);
        files.insert("sheet.png", image, FileLocation::Assets);
        files.insert("sheet.atlas", r#"{"a": [0, 0, 16, 8]}"#, FileLocation::Assets);
        let mut assets = Assets::new(Box::new(files), Box::new(RawCodec), "", 0.5);
        assets.load_all(renderer.backend_mut());
        (renderer, assets, probe)
    }

    #[test]
    fn size_comes_from_source_in_points() {
        let (_, assets, _) = setup();
        let texture = Sprite::from_path(&assets, "hero");
        assert_eq!(texture.map(|s| s.size()), Some(Vec2::new(16.0, 8.0)));

        let region = Sprite::from_path(&assets, "sheet/a");
        let region = region.map(|s| (s.size(), s.uv()));
        assert_eq!(region, Some((Vec2::new(8.0, 4.0), UvRect::new(0.0, 0.0, 0.5, 0.5))));

        assert!(Sprite::from_path(&assets, "missing").is_none());
    }

    #[test]
    fn rejects_bad_size_and_scale() {
        let (_, assets, _) = setup();
        let Some(mut sprite) = Sprite::from_path(&assets, "hero") else {
            panic!("hero sprite");
        };
        for bad in [Vec2::new(-1.0, 2.0), Vec2::new(f32::NAN, 1.0), Vec2::new(1.0, f32::INFINITY)] {
            sprite.set_size(bad);
            sprite.set_scale(bad);
        }
        assert_eq!(sprite.size(), Vec2::new(16.0, 8.0));
        assert_eq!(sprite.scale(), Vec2::ONE);

        sprite.set_size(Vec2::ZERO);
        sprite.set_scale(Vec2::new(0.0, 3.0));
        assert_eq!(sprite.size(), Vec2::ZERO);
        assert_eq!(sprite.scale(), Vec2::new(0.0, 3.0));
    }

    #[test]
    fn origin_scale_and_rotation() {
        let (_, assets, _) = setup();
        let Some(mut sprite) = Sprite::from_path(&assets, "hero") else {
            panic!("hero sprite");
        };
        sprite.set_size(Vec2::new(4.0, 2.0));
        sprite.set_origin_to_center();
        sprite.set_pos(Vec2::new(10.0, 10.0));
        sprite.set_scale(Vec2::splat(2.0));
        let quad = sprite.quad();
        assert_eq!(quad.bottom_left, Vec2::new(6.0, 8.0));
        assert_eq!(quad.top_right, Vec2::new(14.0, 12.0));

        sprite.set_angle(90.0);
        let quad = sprite.quad();
        assert!(quad.bottom_left.abs_diff_eq(Vec2::new(12.0, 6.0), 1e-4));
        assert!(quad.top_right.abs_diff_eq(Vec2::new(8.0, 14.0), 1e-4));
    }

    #[test]
    fn color_keeps_alpha() {
        let (_, assets, _) = setup();
        let Some(mut sprite) = Sprite::from_path(&assets, "hero") else {
            panic!("hero sprite");
        };
        sprite.set_alpha(0.5);
        sprite.set_color(Color::rgb8(255, 0, 0));
        assert_eq!(sprite.color(), Color::new(1.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn sprite_of_unloaded_texture_is_skipped() {
        let (mut renderer, mut assets, probe) = setup();
        let Some(sprite) = Sprite::from_path(&assets, "sheet/a") else {
            panic!("region sprite");
        };
        renderer.begin_render();
        assert!(sprite.render(&mut renderer, &assets));
        assets.unload("sheet");
        assert!(!sprite.render(&mut renderer, &assets));
        renderer.end_render();
        assert_eq!(probe.draw_call_count(), 1);
        assert_eq!(probe.draw_calls()[0].vertex_count(), 6);
    }
}
