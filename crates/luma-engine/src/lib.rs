pub mod api;
pub mod assets;
pub mod bridge;
pub mod core;
pub mod drawables;
pub mod input;
pub mod platform;
pub mod renderer;

// Re-export key types at crate root for convenience
pub use api::{Engine, Platform};
pub use assets::{
    Asset, AssetError, AssetHandle, AssetType, Assets, Font, FrameBuffer, Shader, Texture,
    TextureRegion,
};
pub use bridge::{AfterRender, MapTable, ScriptContext, ScriptError, ScriptFunction, ScriptTable, ScriptValue};
pub use crate::core::{Config, FrameClock, Graphics, Orientation, SafeArea, ScaleMode, Scenes, Sizes};
pub use drawables::{Mesh, ParticleParams, ParticleSystem, RadialMesh, Rng, Sprite, Text};
#[cfg(feature = "vectors")]
pub use drawables::Curve;
pub use input::{TouchEvent, TouchPhase, TouchQueue};
pub use platform::files::{FileLocation, FileSystem, MemoryFileSystem};
pub use platform::image::{ColorFormat, Image, ImageCodec, PixelRect, RawCodec};
#[cfg(feature = "png")]
pub use platform::png::PngCodec;
pub use renderer::{
    BlendMode, Camera, Color, GraphicsBackend, HeadlessBackend, HeadlessProbe, Material, Quad,
    Renderer, UvRect, Vertex,
};
