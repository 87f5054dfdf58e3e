use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::Deserialize;

/// RGBA color, components in 0.0 - 1.0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from 0-255 byte components, fully opaque.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 255)
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Colors in JSON are byte triplets or quadruplets: `[255, 128, 0]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Rgb([r, g, b]) => Color::rgb8(r, g, b),
            ColorRepr::Rgba([r, g, b, a]) => Color::rgba8(r, g, b, a),
        }
    }
}

/// Interleaved batch vertex: position, color, texture coordinate.
/// 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn new(pos: Vec2, color: Color, u: f32, v: f32) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
            u,
            v,
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn color(&self) -> Color {
        Color::new(self.r, self.g, self.b, self.a)
    }
}

/// Texture-space rectangle. `v1` is the top edge, `v2` the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl UvRect {
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(u1: f32, v1: f32, u2: f32, v2: f32) -> Self {
        Self { u1, v1, u2, v2 }
    }

    /// Map a point in unit space (0..1 on both axes, y up) into this rectangle.
    pub fn map(&self, unit: Vec2) -> (f32, f32) {
        (
            self.u1 + (self.u2 - self.u1) * unit.x,
            self.v2 + (self.v1 - self.v2) * unit.y,
        )
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Four corners of a textured quad in content space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub bottom_left: Vec2,
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub uv: UvRect,
}

impl Quad {
    /// Axis-aligned quad with its bottom-left corner at `pos`.
    pub fn rect(pos: Vec2, size: Vec2, uv: UvRect) -> Self {
        Self {
            bottom_left: pos,
            top_left: pos + Vec2::new(0.0, size.y),
            top_right: pos + size,
            bottom_right: pos + Vec2::new(size.x, 0.0),
            uv,
        }
    }

    /// Two triangles: (bl, tl, tr) and (bl, tr, br).
    pub fn vertices(&self, color: Color) -> [Vertex; 6] {
        let UvRect { u1, v1, u2, v2 } = self.uv;
        [
            Vertex::new(self.bottom_left, color, u1, v2),
            Vertex::new(self.top_left, color, u1, v1),
            Vertex::new(self.top_right, color, u2, v1),
            Vertex::new(self.bottom_left, color, u1, v2),
            Vertex::new(self.top_right, color, u2, v1),
            Vertex::new(self.bottom_right, color, u2, v2),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(size_of::<Vertex>(), Vertex::STRIDE_BYTES);
        let verts = [Vertex::default(); 3];
        assert_eq!(bytemuck::cast_slice::<Vertex, f32>(&verts).len(), 24);
    }

    #[test]
    fn quad_vertex_order() {
        let quad = Quad::rect(Vec2::ZERO, Vec2::new(2.0, 1.0), UvRect::new(0.1, 0.2, 0.3, 0.4));
        let v = quad.vertices(Color::WHITE);
        let pos: Vec<Vec2> = v.iter().map(Vertex::pos).collect();
        assert_eq!(
            pos,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(2.0, 0.0),
            ]
        );
        let uv: Vec<(f32, f32)> = v.iter().map(|v| (v.u, v.v)).collect();
        assert_eq!(
            uv,
            vec![(0.1, 0.4), (0.1, 0.2), (0.3, 0.2), (0.1, 0.4), (0.3, 0.2), (0.3, 0.4)]
        );
    }

    #[test]
    fn uv_map_flips_v() {
        let uv = UvRect::new(0.0, 0.0, 1.0, 0.5);
        assert_eq!(uv.map(Vec2::new(0.0, 0.0)), (0.0, 0.5));
        assert_eq!(uv.map(Vec2::new(1.0, 1.0)), (1.0, 0.0));
    }

    #[test]
    fn color_from_json_bytes() {
        let c: Color = serde_json::from_str("[255, 0, 255]").unwrap();
        assert_eq!(c, Color::new(1.0, 0.0, 1.0, 1.0));
        let c: Color = serde_json::from_str("[0, 0, 0, 0]").unwrap();
        assert_eq!(c, Color::TRANSPARENT);
    }

    #[test]
    fn color_lerp_midpoint() {
        let c = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert_eq!(c, Color::new(0.5, 0.5, 0.5, 1.0));
    }
}
