use glam::Vec2;

use super::mesh::Mesh;
use crate::assets::{AssetHandle, Assets, Texture, TextureRegion};
use crate::renderer::{Color, Material, Renderer, UvRect};

/// Angle covered by one triangle of the fan, in degrees.
const WEDGE_DEGREES: f32 = 10.0;

/// Circular progress indicator: a triangle fan covering `progress` of a full
/// turn, starting at `begin_angle` and going counter-clockwise. The texture
/// (or region) is mapped onto the circle's bounding square.
#[derive(Debug, Clone)]
pub struct RadialMesh {
    mesh: Mesh,
    uv: UvRect,
    pos: Vec2,
    size: Vec2,
    scale: f32,
    color: Color,
    begin_angle: f32,
    progress: f32,
    dirty: bool,
}

impl RadialMesh {
    pub fn from_texture(assets: &Assets, texture: AssetHandle<Texture>) -> Option<Self> {
        let Some(t) = assets.get(texture) else {
            log::error!("Attempt to create radial mesh from invalid texture");
            return None;
        };
        let size = Vec2::new(t.width_points(), t.height_points());
        Some(Self::new(Material::textured(texture), UvRect::FULL, size))
    }

    pub fn from_region(assets: &Assets, region: AssetHandle<TextureRegion>) -> Option<Self> {
        let Some(r) = assets.get(region) else {
            log::error!("Attempt to create radial mesh from invalid texture region");
            return None;
        };
        let size = Vec2::new(r.width_points(), r.height_points());
        Some(Self::new(Material::textured(r.texture()), r.uv(), size))
    }

    pub fn new(material: Material, uv: UvRect, size: Vec2) -> Self {
        Self {
            mesh: Mesh::new(material),
            uv,
            pos: Vec2::ZERO,
            size,
            scale: 1.0,
            color: Color::WHITE,
            begin_angle: 0.0,
            progress: 1.0,
            dirty: true,
        }
    }

    /// Center of the circle.
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
        self.dirty = true;
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.dirty = true;
    }

    pub fn set_begin_angle(&mut self, degrees: f32) {
        self.begin_angle = degrees;
        self.dirty = true;
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Fraction of the full turn to draw, in [0, 1]. Other values are refused.
    pub fn set_progress(&mut self, progress: f32) {
        if !(0.0..=1.0).contains(&progress) {
            log::error!("Radial mesh progress should be in range [0.0, 1.0], got {progress}");
            return;
        }
        self.progress = progress;
        self.dirty = true;
    }

    fn build(&mut self) {
        self.mesh.clear();
        self.dirty = false;
        if self.progress <= 0.0 {
            return;
        }

        let radius = self.size.max_element() / 2.0 * self.scale;
        let end = self.begin_angle + 360.0 * self.progress;
        let (center_u, center_v) = self.uv.map(Vec2::splat(0.5));
        let uv_of = |offset: Vec2| self.uv.map((offset / radius + Vec2::ONE) / 2.0);

        let mut angle = self.begin_angle;
        while angle < end {
            let step = WEDGE_DEGREES.min(end - angle);
            let first = Vec2::from_angle(angle.to_radians()) * radius;
            let second = Vec2::from_angle((angle + step).to_radians()) * radius;
            let (u1, v1) = uv_of(first);
            let (u2, v2) = uv_of(second);

            self.mesh.add_vertex(self.pos, self.color, center_u, center_v);
            self.mesh.add_vertex(self.pos + first, self.color, u1, v1);
            self.mesh.add_vertex(self.pos + second, self.color, u2, v2);
            angle += step;
        }
    }

    /// Generated vertices, rebuilding them if a parameter changed.
    pub fn mesh(&mut self) -> &Mesh {
        if self.dirty {
            self.build();
        }
        &self.mesh
    }

    pub fn render(&mut self, renderer: &mut Renderer, assets: &Assets) -> bool {
        if self.dirty {
            self.build();
        }
        self.mesh.render(renderer, assets)
    }
}
