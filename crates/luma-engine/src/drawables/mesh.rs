use glam::Vec2;

use crate::assets::{AssetHandle, Assets, Texture};
use crate::renderer::{Color, Material, Renderer, Vertex};

/// Free-form triangle list over one material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    material: Material,
    vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            vertices: Vec::new(),
        }
    }

    pub fn textured(texture: AssetHandle<Texture>) -> Self {
        Self::new(Material::textured(texture))
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn add_vertex(&mut self, pos: Vec2, color: Color, u: f32, v: f32) {
        self.vertices.push(Vertex::new(pos, color, u, v));
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Submit the triangle list. An empty mesh draws nothing and succeeds.
    pub fn render(&self, renderer: &mut Renderer, assets: &Assets) -> bool {
        if self.vertices.is_empty() {
            return true;
        }
        renderer.render_vertex_array(assets, &self.material, &self.vertices)
    }
}
