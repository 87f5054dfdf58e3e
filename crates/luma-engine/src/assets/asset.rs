//! Asset variants owned by the registry.

use std::collections::HashMap;

use glam::Vec2;

use super::handle::AssetHandle;
use crate::platform::image::{ColorFormat, PixelRect};
use crate::renderer::backend::{GpuFramebuffer, GpuShader, GpuTexture};
use crate::renderer::vertex::UvRect;

/// Variant tag, used where the concrete type is not known statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Texture,
    TextureRegion,
    Font,
    FrameBuffer,
    Shader,
    Json,
}

/// Where a texture's pixels can be fetched again after context loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Image file in the asset tree.
    File(String),
    /// Generated texture written to app data by `Assets::cache_texture`.
    Cached(String),
    /// Framebuffer attachment; comes back blank.
    RenderTarget,
    /// Created from pixels that exist nowhere else.
    Runtime,
}

#[derive(Debug, Clone)]
pub struct Texture {
    gpu: GpuTexture,
    width: u32,
    height: u32,
    format: ColorFormat,
    scale: f32,
    source: TextureSource,
}

impl Texture {
    pub(crate) fn new(
        gpu: GpuTexture,
        width: u32,
        height: u32,
        format: ColorFormat,
        scale: f32,
        source: TextureSource,
    ) -> Self {
        Self {
            gpu,
            width,
            height,
            format,
            scale,
            source,
        }
    }

    pub fn id(&self) -> GpuTexture {
        self.gpu
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Texture scale (points per pixel) the texture was loaded with.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn width_points(&self) -> f32 {
        (self.width as f32 * self.scale).floor()
    }

    pub fn height_points(&self) -> f32 {
        (self.height as f32 * self.scale).floor()
    }

    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    pub fn is_reloadable(&self) -> bool {
        !matches!(self.source, TextureSource::Runtime)
    }

    pub(crate) fn set_gpu(&mut self, gpu: GpuTexture) {
        self.gpu = gpu;
    }

    pub(crate) fn set_source(&mut self, source: TextureSource) {
        self.source = source;
    }
}

/// UV rectangle inside a texture. Does not own the texture.
#[derive(Debug, Clone)]
pub struct TextureRegion {
    texture: AssetHandle<Texture>,
    texture_size: Vec2,
    uv: UvRect,
    scale: f32,
}

impl TextureRegion {
    /// Region covering pixel rectangle `rect` of `texture`.
    pub fn from_rect(handle: AssetHandle<Texture>, texture: &Texture, rect: PixelRect) -> Self {
        let size = Vec2::new(texture.width() as f32, texture.height() as f32);
        let uv = UvRect::new(
            rect.x as f32 / size.x,
            rect.y as f32 / size.y,
            rect.right() as f32 / size.x,
            rect.bottom() as f32 / size.y,
        );
        Self::from_uv(handle, texture, uv)
    }

    pub fn from_uv(handle: AssetHandle<Texture>, texture: &Texture, uv: UvRect) -> Self {
        Self {
            texture: handle,
            texture_size: Vec2::new(texture.width() as f32, texture.height() as f32),
            uv,
            scale: texture.scale(),
        }
    }

    pub fn texture(&self) -> AssetHandle<Texture> {
        self.texture
    }

    pub fn uv(&self) -> UvRect {
        self.uv
    }

    pub fn set_uv(&mut self, uv: UvRect) {
        self.uv = uv;
    }

    /// Width in pixels.
    pub fn width(&self) -> f32 {
        (self.uv.u2 - self.uv.u1) * self.texture_size.x
    }

    /// Height in pixels.
    pub fn height(&self) -> f32 {
        (self.uv.v2 - self.uv.v1) * self.texture_size.y
    }

    pub fn width_points(&self) -> f32 {
        self.width() * self.scale
    }

    pub fn height_points(&self) -> f32 {
        self.height() * self.scale
    }
}

/// Metrics of one bitmap font glyph, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub uv: UvRect,
    pub width: f32,
    pub height: f32,
    /// Offset of the glyph quad from the pen position.
    pub offset: Vec2,
}

impl Glyph {
    pub fn from_rect(texture: &Texture, rect: PixelRect, offset: Vec2) -> Self {
        let (w, h) = (texture.width() as f32, texture.height() as f32);
        Self {
            uv: UvRect::new(
                rect.x as f32 / w,
                rect.y as f32 / h,
                rect.right() as f32 / w,
                rect.bottom() as f32 / h,
            ),
            width: rect.width as f32,
            height: rect.height as f32,
            offset,
        }
    }
}

/// Bitmap font: a glyph table over a texture the font owns.
#[derive(Debug, Clone)]
pub struct Font {
    texture: AssetHandle<Texture>,
    size: u32,
    scale: f32,
    glyphs: HashMap<char, Glyph>,
    unknown: Glyph,
}

impl Font {
    pub(crate) fn new(
        texture: AssetHandle<Texture>,
        size: u32,
        scale: f32,
        glyphs: HashMap<char, Glyph>,
        unknown: Glyph,
    ) -> Self {
        Self {
            texture,
            size,
            scale,
            glyphs,
            unknown,
        }
    }

    pub fn texture(&self) -> AssetHandle<Texture> {
        self.texture
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Points per glyph pixel.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Glyph for `c`, or the mandatory unknown-character glyph.
    pub fn glyph(&self, c: char) -> &Glyph {
        self.glyphs.get(&c).unwrap_or(&self.unknown)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Advance width of `text` in points.
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.glyph(c).width).sum::<f32>() * self.scale
    }
}

#[derive(Debug, Clone)]
pub struct Shader {
    gpu: GpuShader,
    vertex_source: String,
    fragment_source: String,
}

impl Shader {
    pub(crate) fn new(gpu: GpuShader, vertex_source: String, fragment_source: String) -> Self {
        Self {
            gpu,
            vertex_source,
            fragment_source,
        }
    }

    pub fn id(&self) -> GpuShader {
        self.gpu
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub(crate) fn set_gpu(&mut self, gpu: GpuShader) {
        self.gpu = gpu;
    }
}

/// Offscreen render target backed by a texture the framebuffer owns.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    gpu: GpuFramebuffer,
    texture: AssetHandle<Texture>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    pub(crate) fn new(gpu: GpuFramebuffer, texture: AssetHandle<Texture>, width: u32, height: u32) -> Self {
        Self {
            gpu,
            texture,
            width,
            height,
        }
    }

    pub fn id(&self) -> GpuFramebuffer {
        self.gpu
    }

    pub fn texture(&self) -> AssetHandle<Texture> {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn set_gpu(&mut self, gpu: GpuFramebuffer) {
        self.gpu = gpu;
    }
}

/// Parsed `.json` data file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonData(pub serde_json::Value);

#[derive(Debug, Clone)]
pub enum Asset {
    Texture(Texture),
    TextureRegion(TextureRegion),
    Font(Font),
    FrameBuffer(FrameBuffer),
    Shader(Shader),
    Json(JsonData),
}

impl Asset {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Texture(_) => AssetType::Texture,
            Asset::TextureRegion(_) => AssetType::TextureRegion,
            Asset::Font(_) => AssetType::Font,
            Asset::FrameBuffer(_) => AssetType::FrameBuffer,
            Asset::Shader(_) => AssetType::Shader,
            Asset::Json(_) => AssetType::Json,
        }
    }
}

/// Typed access into [`Asset`], used by handle lookups.
pub trait AssetKind: Sized + 'static {
    const TYPE: AssetType;

    fn from_asset(asset: &Asset) -> Option<&Self>;

    fn from_asset_mut(asset: &mut Asset) -> Option<&mut Self>;
}

macro_rules! asset_kind {
    ($ty:ty, $variant:ident) => {
        impl AssetKind for $ty {
            const TYPE: AssetType = AssetType::$variant;

            fn from_asset(asset: &Asset) -> Option<&Self> {
                match asset {
                    Asset::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_asset_mut(asset: &mut Asset) -> Option<&mut Self> {
                match asset {
                    Asset::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

asset_kind!(Texture, Texture);
asset_kind!(TextureRegion, TextureRegion);
asset_kind!(Font, Font);
asset_kind!(FrameBuffer, FrameBuffer);
asset_kind!(Shader, Shader);
asset_kind!(JsonData, Json);
