//! GPU backend seam.
//!
//! The batching [`Renderer`](super::Renderer) decides *what* to draw and
//! *when* to flush; a [`GraphicsBackend`] turns that into API calls for a
//! concrete GPU (GLES, Metal, wgpu...). Backends also own GPU object
//! lifetimes: the asset registry only ever holds the opaque ids defined here.

use glam::Mat4;
use serde::Deserialize;

use super::vertex::Color;
use crate::platform::image::{Image, PixelRect};

/// Opaque GPU texture id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTexture(pub u32);

/// Opaque GPU shader program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuShader(pub u32);

/// Opaque GPU framebuffer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuFramebuffer(pub u32);

/// A GPU object queued for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResource {
    Texture(GpuTexture),
    Shader(GpuShader),
    Framebuffer(GpuFramebuffer),
}

/// How source pixels combine with the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Standard alpha blending (premultiplied-free `src_alpha, 1 - src_alpha`).
    #[default]
    Alpha,
    /// Additive blending for glows and sparks.
    Additive,
    /// Multiply framebuffer by source color.
    Multiply,
    /// Blending disabled.
    None,
}

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// Complete GPU binding state for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// `None` draws untextured (solid color) geometry.
    pub texture: Option<GpuTexture>,
    pub shader: GpuShader,
    pub blend: BlendMode,
    /// Physical-pixel clip rectangle, origin bottom-left.
    pub scissor: Option<PixelRect>,
    /// Offscreen target; `None` draws to the screen.
    pub target: Option<GpuFramebuffer>,
    /// View-projection matrix of the camera.
    pub transform: Mat4,
}

/// Built-in shader used when a material names none.
pub const DEFAULT_VERTEX_SHADER: &str = "\
attribute vec2 a_position;
attribute vec4 a_color;
attribute vec2 a_texCoords;
uniform mat4 u_transformMatrix;
varying vec4 v_color;
varying vec2 v_texCoords;
void main() {
    gl_Position = u_transformMatrix * vec4(a_position, 0.0, 1.0);
    v_color = a_color;
    v_texCoords = a_texCoords;
}
";

pub const DEFAULT_FRAGMENT_SHADER: &str = "\
precision mediump float;
uniform sampler2D u_texture;
uniform bool u_textured;
varying vec4 v_color;
varying vec2 v_texCoords;
void main() {
    gl_FragColor = u_textured ? texture2D(u_texture, v_texCoords) * v_color : v_color;
}
";

/// GPU backend contract.
///
/// Creation methods return `None` on failure; implementations log the
/// reason. Vertex data is always interleaved [`Vertex`](super::Vertex)
/// floats: `x, y, r, g, b, a, u, v`.
pub trait GraphicsBackend {
    /// Backend identifier (e.g. "gles2", "headless").
    fn backend(&self) -> &'static str;

    fn create_texture(&mut self, image: &Image) -> Option<GpuTexture>;

    fn delete_texture(&mut self, texture: GpuTexture);

    fn compile_shader(&mut self, vertex_source: &str, fragment_source: &str) -> Option<GpuShader>;

    fn delete_shader(&mut self, shader: GpuShader);

    /// Create a framebuffer rendering into `texture`.
    fn create_framebuffer(&mut self, texture: GpuTexture) -> Option<GpuFramebuffer>;

    fn delete_framebuffer(&mut self, framebuffer: GpuFramebuffer);

    /// Read back the full contents of a framebuffer as RGBA.
    fn read_pixels(&mut self, framebuffer: GpuFramebuffer, width: u32, height: u32) -> Option<Image>;

    fn set_viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, color: Color);

    /// Bind `state`, upload `vertices` and issue one draw call.
    fn draw(&mut self, state: &DrawState, primitive: Primitive, vertices: &[f32]);

    /// Free a resource previously queued for release.
    fn release(&mut self, resource: GpuResource) {
        match resource {
            GpuResource::Texture(id) => self.delete_texture(id),
            GpuResource::Shader(id) => self.delete_shader(id),
            GpuResource::Framebuffer(id) => self.delete_framebuffer(id),
        }
    }
}
