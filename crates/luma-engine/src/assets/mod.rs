pub mod asset;
pub mod description;
pub mod error;
pub mod handle;
pub mod loader;
pub mod path;
pub mod registry;

pub use asset::{
    Asset, AssetKind, AssetType, Font, FrameBuffer, Glyph, JsonData, Shader, Texture, TextureRegion,
    TextureSource,
};
pub use error::AssetError;
pub use handle::{AssetHandle, AssetKey};
pub use loader::{AssetLoader, LoadContext, LoadedAsset};
pub use registry::Assets;
