//! Asset loader strategies.
//!
//! A loader turns one source file into a [`LoadedAsset`] without touching
//! the registry. Everything that can fail (reading, parsing, decoding,
//! validating, GPU upload) happens inside `load`, so the registry either
//! commits the whole result or nothing.

use super::asset::{Texture, TextureSource};
use super::description::{AtlasDescription, FontDescription};
use super::error::AssetError;
use super::path;
use crate::platform::files::{FileLocation, FileSystem};
use crate::platform::image::{Image, ImageCodec, PixelRect};
use crate::renderer::backend::GraphicsBackend;

/// Everything a loader may use.
pub struct LoadContext<'a> {
    pub files: &'a dyn FileSystem,
    pub codec: &'a dyn ImageCodec,
    pub gpu: &'a mut dyn GraphicsBackend,
    pub texture_scale: f32,
}

/// Result of a successful load, staged for registration.
#[derive(Debug)]
pub enum LoadedAsset {
    Texture(Texture),
    /// One shared texture plus its named regions, in description order.
    Atlas {
        texture: Texture,
        regions: Vec<(String, PixelRect)>,
    },
    Font {
        texture: Texture,
        description: FontDescription,
    },
    Json(serde_json::Value),
}

pub trait AssetLoader {
    fn load(&self, path: &str, ctx: &mut LoadContext<'_>) -> Result<LoadedAsset, AssetError>;
}

/// Plain `.png` image.
pub struct TextureLoader;

/// `.png` with a sibling `.atlas` description.
pub struct AtlasLoader;

/// `.png` with a sibling `.font` description.
pub struct FontLoader;

/// `.json` data file.
pub struct JsonLoader;

/// Pick the loader for `path` by extension. A `.png` paired with a `.atlas`
/// or `.font` description goes to the matching description loader.
pub fn select_loader(files: &dyn FileSystem, path: &str) -> Option<&'static dyn AssetLoader> {
    match path::extension(path) {
        "png" => {
            let has = |ext| files.is_file(&path::replace_extension(path, ext), FileLocation::Assets);
            if has("atlas") {
                Some(&AtlasLoader)
            } else if has("font") {
                Some(&FontLoader)
            } else {
                Some(&TextureLoader)
            }
        }
        "json" => Some(&JsonLoader),
        _ => None,
    }
}

fn read(files: &dyn FileSystem, path: &str) -> Result<Vec<u8>, AssetError> {
    files
        .read_file(path, FileLocation::Assets)
        .ok_or_else(|| AssetError::NotFound(path.to_string()))
}

fn read_text(files: &dyn FileSystem, path: &str) -> Result<String, AssetError> {
    files
        .read_to_string(path, FileLocation::Assets)
        .ok_or_else(|| AssetError::NotFound(path.to_string()))
}

fn decode(codec: &dyn ImageCodec, path: &str, bytes: &[u8]) -> Result<Image, AssetError> {
    codec
        .decode(bytes)
        .ok_or_else(|| AssetError::Decode(path.to_string()))
}

/// Upload `image` and wrap the GPU id.
pub(crate) fn upload_texture(
    gpu: &mut dyn GraphicsBackend,
    image: &Image,
    texture_scale: f32,
    source: TextureSource,
) -> Result<Texture, AssetError> {
    let id = gpu
        .create_texture(image)
        .ok_or_else(|| AssetError::Gpu(format!("{}x{} texture", image.width(), image.height())))?;
    Ok(Texture::new(
        id,
        image.width(),
        image.height(),
        image.format(),
        texture_scale,
        source,
    ))
}

impl AssetLoader for TextureLoader {
    fn load(&self, path: &str, ctx: &mut LoadContext<'_>) -> Result<LoadedAsset, AssetError> {
        let image = decode(ctx.codec, path, &read(ctx.files, path)?)?;
        let texture = upload_texture(
            ctx.gpu,
            &image,
            ctx.texture_scale,
            TextureSource::File(path.to_string()),
        )?;
        Ok(LoadedAsset::Texture(texture))
    }
}

impl AssetLoader for AtlasLoader {
    fn load(&self, path: &str, ctx: &mut LoadContext<'_>) -> Result<LoadedAsset, AssetError> {
        let description_path = path::replace_extension(path, "atlas");
        let description =
            AtlasDescription::from_json(&description_path, &read_text(ctx.files, &description_path)?)?;

        let image = decode(ctx.codec, path, &read(ctx.files, path)?)?;
        description.validate(&description_path, image.width(), image.height())?;

        let texture = upload_texture(
            ctx.gpu,
            &image,
            ctx.texture_scale,
            TextureSource::File(path.to_string()),
        )?;
        Ok(LoadedAsset::Atlas {
            texture,
            regions: description.regions,
        })
    }
}

impl AssetLoader for FontLoader {
    fn load(&self, path: &str, ctx: &mut LoadContext<'_>) -> Result<LoadedAsset, AssetError> {
        let description_path = path::replace_extension(path, "font");
        let description =
            FontDescription::from_json(&description_path, &read_text(ctx.files, &description_path)?)?;

        let image = decode(ctx.codec, path, &read(ctx.files, path)?)?;
        description.validate(&description_path, image.width(), image.height())?;

        let texture = upload_texture(
            ctx.gpu,
            &image,
            ctx.texture_scale,
            TextureSource::File(path.to_string()),
        )?;
        Ok(LoadedAsset::Font {
            texture,
            description,
        })
    }
}

impl AssetLoader for JsonLoader {
    fn load(&self, path: &str, ctx: &mut LoadContext<'_>) -> Result<LoadedAsset, AssetError> {
        let value = serde_json::from_str(&read_text(ctx.files, path)?)?;
        Ok(LoadedAsset::Json(value))
    }
}
