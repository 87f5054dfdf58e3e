//! Smooth textured strips through a list of knots, tessellated with lyon.
//!
//! The texture (or region) is stretched along the curve: `u` follows the
//! distance travelled, `v` spans the stroke width.

use glam::Vec2;
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, LineCap, LineJoin, Side, StrokeOptions, StrokeTessellator, StrokeVertex,
    StrokeVertexConstructor, VertexBuffers,
};

use super::mesh::Mesh;
use crate::assets::{AssetHandle, Assets, Texture, TextureRegion};
use crate::renderer::{Color, Material, Renderer, UvRect};

const TOLERANCE: f32 = 0.5;

/// Stroke vertex before the `u` coordinate is known: advancement along the
/// path and which side of the path it lies on.
#[derive(Debug, Clone, Copy)]
struct StripVertex {
    pos: Vec2,
    advancement: f32,
    positive: bool,
}

struct StripVertexCtor;

impl StrokeVertexConstructor<StripVertex> for StripVertexCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> StripVertex {
        let p = vertex.position();
        StripVertex {
            pos: Vec2::new(p.x, p.y),
            advancement: vertex.advancement(),
            positive: vertex.side() == Side::Positive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Curve {
    mesh: Mesh,
    uv: UvRect,
    knots: Vec<Vec2>,
    width: f32,
    color: Color,
    dirty: bool,
}

impl Curve {
    pub fn new(material: Material, uv: UvRect, width: f32) -> Self {
        Self {
            mesh: Mesh::new(material),
            uv,
            knots: Vec::new(),
            width,
            color: Color::WHITE,
            dirty: true,
        }
    }

    pub fn from_texture(assets: &Assets, texture: AssetHandle<Texture>, width: f32) -> Option<Self> {
        if !assets.is_alive(texture) {
            log::error!("Attempt to create curve from invalid texture");
            return None;
        }
        Some(Self::new(Material::textured(texture), UvRect::FULL, width))
    }

    pub fn from_region(assets: &Assets, region: AssetHandle<TextureRegion>, width: f32) -> Option<Self> {
        let Some(r) = assets.get(region) else {
            log::error!("Attempt to create curve from invalid texture region");
            return None;
        };
        Some(Self::new(Material::textured(r.texture()), r.uv(), width))
    }

    pub fn knots(&self) -> &[Vec2] {
        &self.knots
    }

    pub fn set_knots(&mut self, knots: Vec<Vec2>) {
        self.knots = knots;
        self.dirty = true;
    }

    pub fn add_knot(&mut self, knot: Vec2) {
        self.knots.push(knot);
        self.dirty = true;
    }

    pub fn clear_knots(&mut self) {
        self.knots.clear();
        self.dirty = true;
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_width(&mut self, width: f32) {
        if !(width > 0.0) {
            log::error!("Curve width must be positive, got {width}");
            return;
        }
        self.width = width;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.dirty = true;
    }

    /// Path through the knots: straight ends, quadratic segments between
    /// the midpoints of consecutive knots.
    fn path(&self) -> Option<Path> {
        let [first, .., last] = self.knots.as_slice() else {
            return None;
        };
        let mut builder = Path::builder();
        builder.begin(point(first.x, first.y));
        for pair in self.knots.windows(2).skip(1) {
            let mid = (pair[0] + pair[1]) / 2.0;
            builder.quadratic_bezier_to(point(pair[0].x, pair[0].y), point(mid.x, mid.y));
        }
        builder.line_to(point(last.x, last.y));
        builder.end(false);
        Some(builder.build())
    }

    fn build(&mut self) {
        self.mesh.clear();
        self.dirty = false;
        let Some(path) = self.path() else {
            return;
        };

        let mut geometry: VertexBuffers<StripVertex, u32> = VertexBuffers::new();
        let options = StrokeOptions::tolerance(TOLERANCE)
            .with_line_width(self.width)
            .with_line_cap(LineCap::Butt)
            .with_line_join(LineJoin::Round);
        let result = StrokeTessellator::new().tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut geometry, StripVertexCtor),
        );
        if let Err(err) = result {
            log::error!("Curve tessellation failed: {err:?}");
            return;
        }

        let length = geometry
            .vertices
            .iter()
            .map(|v| v.advancement)
            .fold(0.0_f32, f32::max);
        let UvRect { u1, v1, u2, v2 } = self.uv;
        for &index in &geometry.indices {
            let Some(v) = geometry.vertices.get(index as usize) else {
                continue;
            };
            let t = if length > 0.0 { v.advancement / length } else { 0.0 };
            let v_coord = if v.positive { v1 } else { v2 };
            self.mesh.add_vertex(v.pos, self.color, u1 + (u2 - u1) * t, v_coord);
        }
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(knots: &[Vec2]) -> Curve {
        let mut curve = Curve::new(Material::solid(), UvRect::new(0.25, 0.0, 0.75, 0.5), 2.0);
        curve.set_knots(knots.to_vec());
        curve
    }

    #[test]
    fn needs_two_knots() {
        assert!(curve(&[]).mesh().is_empty());
        assert!(curve(&[Vec2::ZERO]).mesh().is_empty());
    }

    #[test]
    fn straight_strip_spans_width_and_region() {
        let mut c = curve(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        let vertices = c.mesh().vertices();
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len() % 3, 0);
        for v in vertices {
            assert!(v.y.abs() <= 1.0 + 1e-4);
            assert!((-1e-4..=10.0 + 1e-4).contains(&v.x));
            assert!((0.25..=0.75).contains(&v.u));
            assert!(v.v == 0.0 || v.v == 0.5);
            // u grows with x along a straight line.
            assert!((v.u - (0.25 + 0.5 * v.x / 10.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn smooth_curve_passes_near_ends() {
        let mut c = curve(&[Vec2::ZERO, Vec2::new(10.0, 10.0), Vec2::new(20.0, 0.0)]);
        let vertices = c.mesh().vertices();
        assert!(!vertices.is_empty());
        let max_x = vertices.iter().map(|v| v.x).fold(f32::MIN, f32::max);
        assert!((max_x - 20.0).abs() < 1.5);
        let max_u = vertices.iter().map(|v| v.u).fold(f32::MIN, f32::max);
        assert!((max_u - 0.75).abs() < 1e-5);
    }

    #[test]
    fn rejects_bad_width() {
        let mut c = curve(&[]);
        c.set_width(0.0);
        c.set_width(f32::NAN);
        assert_eq!(c.width(), 2.0);
    }
}
