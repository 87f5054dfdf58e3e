//! Geometry builders on top of the renderer: each turns asset references
//! and a few parameters into quads or triangle lists.

#[cfg(feature = "vectors")]
pub mod curve;
pub mod mesh;
pub mod particles;
pub mod radial_mesh;
pub mod rng;
pub mod sprite;
pub mod text;

#[cfg(feature = "vectors")]
pub use curve::Curve;
pub use mesh::Mesh;
pub use particles::{ParticleParams, ParticleSystem, Range, SpawnAreaMode, TextureSelectionMode};
pub use radial_mesh::RadialMesh;
pub use rng::Rng;
pub use sprite::Sprite;
pub use text::Text;
