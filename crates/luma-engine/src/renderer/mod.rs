pub mod backend;
pub mod batch;
pub mod camera;
pub mod headless;
pub mod material;
pub mod vertex;

// Re-export key types for convenient access
pub use backend::{
    BlendMode, DrawState, GpuFramebuffer, GpuResource, GpuShader, GpuTexture, GraphicsBackend,
    Primitive,
};
pub use batch::{RenderStats, Renderer, DEFAULT_MAX_VERTICES};
pub use camera::Camera;
pub use headless::{DrawCall, HeadlessBackend, HeadlessProbe};
pub use material::Material;
pub use vertex::{Color, Quad, UvRect, Vertex};
