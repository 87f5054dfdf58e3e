use crate::assets::{AssetHandle, Shader, Texture};

use super::backend::BlendMode;

/// Texture, shader and blend mode of a draw.
///
/// `texture: None` draws solid color geometry; `shader: None` uses the
/// renderer's default shader. Handles are weak: a material naming an
/// unloaded asset is refused at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Material {
    pub texture: Option<AssetHandle<Texture>>,
    pub shader: Option<AssetHandle<Shader>>,
    pub blend: BlendMode,
}

impl Material {
    /// Untextured, default shader, alpha blending.
    pub fn solid() -> Self {
        Self::default()
    }

    pub fn textured(texture: AssetHandle<Texture>) -> Self {
        Self {
            texture: Some(texture),
            ..Self::default()
        }
    }

    pub fn with_shader(mut self, shader: AssetHandle<Shader>) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}
