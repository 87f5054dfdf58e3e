//! Recording backend with no GPU behind it.
//!
//! Keeps every created object in maps so tests and tools can check
//! lifetimes, and records draw calls instead of rasterizing them. The
//! backend is usually boxed into a [`Renderer`](super::Renderer), so its
//! state is shared with a [`HeadlessProbe`] that stays with the caller.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::backend::{
    DrawState, GpuFramebuffer, GpuShader, GpuTexture, GraphicsBackend, Primitive,
};
use super::vertex::{Color, Vertex};
use crate::platform::image::Image;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub state: DrawState,
    pub primitive: Primitive,
    pub vertices: Vec<f32>,
}

impl DrawCall {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Vertex::FLOATS
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u32,
    context_generation: u32,
    textures: HashMap<u32, Image>,
    shaders: HashSet<u32>,
    framebuffers: HashMap<u32, GpuTexture>,
    draw_calls: Vec<DrawCall>,
    clears: Vec<Color>,
    viewport: (u32, u32),
    fail_shader_compile: bool,
}

impl HeadlessState {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspection handle sharing this backend's state.
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }
}

/// Read side of a [`HeadlessBackend`], plus the switches that simulate
/// driver failures.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessProbe {
    /// Drop every GPU object, as a mobile OS does when the GL context dies.
    /// Ids keep counting so stale handles never alias new objects.
    pub fn lose_context(&self) {
        let mut state = self.state.borrow_mut();
        state.textures.clear();
        state.shaders.clear();
        state.framebuffers.clear();
        state.context_generation += 1;
        log::info!("Headless context lost (generation {})", state.context_generation);
    }

    pub fn context_generation(&self) -> u32 {
        self.state.borrow().context_generation
    }

    pub fn set_fail_shader_compile(&self, fail: bool) {
        self.state.borrow_mut().fail_shader_compile = fail;
    }

    pub fn is_texture_alive(&self, texture: GpuTexture) -> bool {
        self.state.borrow().textures.contains_key(&texture.0)
    }

    pub fn is_shader_alive(&self, shader: GpuShader) -> bool {
        self.state.borrow().shaders.contains(&shader.0)
    }

    pub fn is_framebuffer_alive(&self, framebuffer: GpuFramebuffer) -> bool {
        self.state.borrow().framebuffers.contains_key(&framebuffer.0)
    }

    pub fn texture_image(&self, texture: GpuTexture) -> Option<Image> {
        self.state.borrow().textures.get(&texture.0).cloned()
    }

    pub fn texture_count(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn draw_calls(&self) -> Ref<'_, [DrawCall]> {
        Ref::map(self.state.borrow(), |s| s.draw_calls.as_slice())
    }

    pub fn draw_call_count(&self) -> usize {
        self.state.borrow().draw_calls.len()
    }

    pub fn take_draw_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.state.borrow_mut().draw_calls)
    }

    pub fn clears(&self) -> Vec<Color> {
        self.state.borrow().clears.clone()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.state.borrow().viewport
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn backend(&self) -> &'static str {
        "headless"
    }

    fn create_texture(&mut self, image: &Image) -> Option<GpuTexture> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.textures.insert(id, image.clone());
        Some(GpuTexture(id))
    }

    fn delete_texture(&mut self, texture: GpuTexture) {
        self.state.borrow_mut().textures.remove(&texture.0);
    }

    fn compile_shader(&mut self, vertex_source: &str, fragment_source: &str) -> Option<GpuShader> {
        let mut state = self.state.borrow_mut();
        if state.fail_shader_compile || vertex_source.is_empty() || fragment_source.is_empty() {
            log::error!("Headless shader compilation failed");
            return None;
        }
        let id = state.allocate();
        state.shaders.insert(id);
        Some(GpuShader(id))
    }

    fn delete_shader(&mut self, shader: GpuShader) {
        self.state.borrow_mut().shaders.remove(&shader.0);
    }

    fn create_framebuffer(&mut self, texture: GpuTexture) -> Option<GpuFramebuffer> {
        let mut state = self.state.borrow_mut();
        if !state.textures.contains_key(&texture.0) {
            log::error!("Cannot create framebuffer for dead texture {}", texture.0);
            return None;
        }
        let id = state.allocate();
        state.framebuffers.insert(id, texture);
        Some(GpuFramebuffer(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: GpuFramebuffer) {
        self.state.borrow_mut().framebuffers.remove(&framebuffer.0);
    }

    fn read_pixels(&mut self, framebuffer: GpuFramebuffer, width: u32, height: u32) -> Option<Image> {
        let state = self.state.borrow();
        let texture = state.framebuffers.get(&framebuffer.0)?;
        let image = state.textures.get(&texture.0)?;
        (image.width() == width && image.height() == height).then(|| image.clone())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = (width, height);
    }

    fn clear(&mut self, color: Color) {
        self.state.borrow_mut().clears.push(color);
    }

    fn draw(&mut self, state: &DrawState, primitive: Primitive, vertices: &[f32]) {
        self.state.borrow_mut().draw_calls.push(DrawCall {
            state: *state,
            primitive,
            vertices: vertices.to_vec(),
        });
    }
}
