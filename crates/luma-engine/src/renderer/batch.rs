//! Batching renderer.
//!
//! Geometry is collected into one interleaved vertex buffer while the
//! submitted materials agree. A different texture, shader or blend mode, a
//! camera change, a line draw or the end of the frame flushes the buffer as
//! a single draw call.

use glam::Vec2;

use super::backend::{
    BlendMode, DrawState, GpuFramebuffer, GpuShader, GpuTexture, GraphicsBackend, Primitive,
    DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
};
use super::camera::Camera;
use super::material::Material;
use super::vertex::{Color, Quad, Vertex};
use crate::assets::{AssetHandle, Assets, FrameBuffer};
use crate::platform::image::{Image, PixelRect};

/// Default batch capacity: 2048 quads.
pub const DEFAULT_MAX_VERTICES: usize = 6 * 2048;

/// Counters of the current (or last finished) frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub render_calls: usize,
    pub rendered_vertices: usize,
}

/// GPU ids a material resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    texture: Option<GpuTexture>,
    shader: GpuShader,
    blend: BlendMode,
}

pub struct Renderer {
    backend: Box<dyn GraphicsBackend>,
    camera: Camera,
    default_shader: Option<GpuShader>,
    batch: Vec<Vertex>,
    binding: Option<Binding>,
    target: Option<(GpuFramebuffer, u32, u32)>,
    background: Color,
    scissor: Option<PixelRect>,
    debug: bool,
    debug_lines: Vec<Vertex>,
    in_progress: bool,
    stats: RenderStats,
    max_vertices: usize,
}

impl Renderer {
    pub fn new(mut backend: Box<dyn GraphicsBackend>, camera: Camera) -> Self {
        let default_shader = compile_default_shader(backend.as_mut());
        log::info!("Renderer created on {} backend", backend.backend());
        Self {
            backend,
            camera,
            default_shader,
            batch: Vec::with_capacity(DEFAULT_MAX_VERTICES),
            binding: None,
            target: None,
            background: Color::WHITE,
            scissor: None,
            debug: false,
            debug_lines: Vec::new(),
            in_progress: false,
            stats: RenderStats::default(),
            max_vertices: DEFAULT_MAX_VERTICES,
        }
    }

    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access. Flushes first when a frame is in progress so
    /// pending geometry keeps the transform it was submitted under.
    pub fn camera_mut(&mut self) -> &mut Camera {
        if self.in_progress {
            self.flush();
        }
        &mut self.camera
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Draw triangle edges over everything submitted while enabled.
    pub fn set_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    pub fn scissor(&self) -> Option<PixelRect> {
        self.scissor
    }

    /// Physical-pixel clip rectangle, applied at the next flush.
    pub fn set_scissor(&mut self, rect: Option<PixelRect>) {
        self.scissor = rect;
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    pub fn set_max_vertices(&mut self, max: usize) {
        if max < 6 {
            log::error!("Batch capacity must hold at least one quad, got {max} vertices");
            return;
        }
        self.max_vertices = max;
    }

    pub fn default_shader(&self) -> Option<GpuShader> {
        self.default_shader
    }

    /// Recompile the built-in shader after context loss.
    pub fn reload_default_shader(&mut self) {
        self.default_shader = compile_default_shader(self.backend.as_mut());
        self.binding = None;
    }

    pub fn begin_render(&mut self) {
        if self.in_progress {
            log::warn!("begin_render called while a frame is in progress");
        }
        self.in_progress = true;
        self.batch.clear();
        self.binding = None;
        self.debug_lines.clear();
        self.stats = RenderStats::default();

        let (width, height) = self.viewport_size();
        self.backend.set_viewport(width, height);
        self.backend.clear(self.background);
    }

    pub fn end_render(&mut self) {
        self.flush();
        if !self.debug_lines.is_empty() {
            let lines = std::mem::take(&mut self.debug_lines);
            self.draw_lines(&lines);
        }
        self.in_progress = false;
    }

    /// Draw whatever the batch holds. Counters are updated per draw call.
    pub fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        if let Some(binding) = self.binding {
            let state = self.draw_state(binding);
            self.backend
                .draw(&state, Primitive::Triangles, bytemuck::cast_slice(&self.batch));
            self.stats.render_calls += 1;
            self.stats.rendered_vertices += self.batch.len();
        }
        self.batch.clear();
    }

    /// Submit one quad. Returns `false` if the material does not resolve or
    /// no frame is in progress.
    pub fn render_quad(&mut self, assets: &Assets, material: &Material, quad: &Quad, color: Color) -> bool {
        self.submit(assets, material, &quad.vertices(color))
    }

    /// Submit a triangle list.
    pub fn render_vertex_array(&mut self, assets: &Assets, material: &Material, vertices: &[Vertex]) -> bool {
        if vertices.len() % 3 != 0 {
            log::error!("Vertex array of {} vertices is not a triangle list", vertices.len());
            return false;
        }
        self.submit(assets, material, vertices)
    }

    /// Draw a single untextured line immediately.
    pub fn render_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        if !self.in_progress {
            log::error!("Cannot render a line outside begin_render/end_render");
            return;
        }
        self.flush();
        self.draw_lines(&[
            Vertex::new(from, color, 0.0, 0.0),
            Vertex::new(to, color, 0.0, 0.0),
        ]);
    }

    /// Direct following draws into `framebuffer`, or back to the screen with
    /// an empty handle. Flushes first.
    pub fn set_render_target(&mut self, assets: &Assets, framebuffer: AssetHandle<FrameBuffer>) -> bool {
        let target = if framebuffer.is_empty() {
            None
        } else {
            let Some(fb) = assets.get(framebuffer) else {
                log::error!("Cannot render to framebuffer: framebuffer has been unloaded");
                return false;
            };
            Some((fb.id(), fb.width(), fb.height()))
        };
        self.flush();
        self.target = target;
        let (width, height) = self.viewport_size();
        self.backend.set_viewport(width, height);
        true
    }

    /// Read back a framebuffer's pixels, flushing pending geometry first.
    pub fn read_pixels(&mut self, assets: &Assets, framebuffer: AssetHandle<FrameBuffer>) -> Option<Image> {
        let Some(fb) = assets.get(framebuffer) else {
            log::error!("Cannot read pixels: framebuffer has been unloaded");
            return None;
        };
        let (id, width, height) = (fb.id(), fb.width(), fb.height());
        if self.in_progress {
            self.flush();
        }
        self.backend.read_pixels(id, width, height)
    }

    fn viewport_size(&self) -> (u32, u32) {
        match self.target {
            Some((_, width, height)) => (width, height),
            None => {
                let viewport = self.camera.viewport();
                (viewport.x as u32, viewport.y as u32)
            }
        }
    }

    fn draw_state(&self, binding: Binding) -> DrawState {
        DrawState {
            texture: binding.texture,
            shader: binding.shader,
            blend: binding.blend,
            scissor: self.scissor,
            target: self.target.map(|(id, _, _)| id),
            transform: self.camera.matrix(),
        }
    }

    fn resolve(&self, assets: &Assets, material: &Material) -> Option<Binding> {
        let texture = match material.texture {
            None => None,
            Some(handle) => match assets.get(handle) {
                Some(texture) => Some(texture.id()),
                None => {
                    log::error!("Cannot render: material texture has been unloaded");
                    return None;
                }
            },
        };
        let shader = match material.shader {
            None => match self.default_shader {
                Some(shader) => shader,
                None => {
                    log::error!("Cannot render: default shader is not available");
                    return None;
                }
            },
            Some(handle) => match assets.get(handle) {
                Some(shader) => shader.id(),
                None => {
                    log::error!("Cannot render: material shader has been unloaded");
                    return None;
                }
            },
        };
        Some(Binding {
            texture,
            shader,
            blend: material.blend,
        })
    }

    fn submit(&mut self, assets: &Assets, material: &Material, vertices: &[Vertex]) -> bool {
        if !self.in_progress {
            log::error!("Cannot render outside begin_render/end_render");
            return false;
        }
        let Some(binding) = self.resolve(assets, material) else {
            return false;
        };

        let switched = self.binding.is_some_and(|current| current != binding);
        if switched || self.batch.len() + vertices.len() > self.max_vertices {
            self.flush();
        }
        self.binding = Some(binding);
        self.batch.extend_from_slice(vertices);

        if self.debug {
            for tri in vertices.chunks_exact(3) {
                let color = tri[0].color();
                for (a, b) in [(0, 1), (1, 2), (0, 2)] {
                    self.debug_lines.push(Vertex::new(tri[a].pos(), color, 0.0, 0.0));
                    self.debug_lines.push(Vertex::new(tri[b].pos(), color, 0.0, 0.0));
                }
            }
        }
        true
    }

    fn draw_lines(&mut self, lines: &[Vertex]) {
        let Some(shader) = self.default_shader else {
            log::error!("Cannot render lines: default shader is not available");
            return;
        };
        let state = self.draw_state(Binding {
            texture: None,
            shader,
            blend: BlendMode::Alpha,
        });
        self.backend
            .draw(&state, Primitive::Lines, bytemuck::cast_slice(lines));
        self.stats.render_calls += 1;
        self.stats.rendered_vertices += lines.len();
    }
}

fn compile_default_shader(backend: &mut dyn GraphicsBackend) -> Option<GpuShader> {
    let shader = backend.compile_shader(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER);
    if shader.is_none() {
        log::error!("Default shader compilation failed, untextured and default draws are disabled");
    }
    shader
}
