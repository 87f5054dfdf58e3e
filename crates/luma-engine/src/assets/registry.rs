//! The asset registry.
//!
//! `Assets` is the only owner of loaded assets. Everything else refers to
//! them through [`AssetHandle`]s, which stop resolving as soon as the asset
//! is unloaded. Entries are keyed by normalized virtual path (see
//! [`path::normalize`]); a key is never overwritten, a second load of the
//! same key is rejected.

use std::collections::HashMap;

use glam::Vec2;
use slotmap::SlotMap;

use super::asset::{
    Asset, AssetKind, AssetType, Font, FrameBuffer, Glyph, JsonData, Shader, Texture, TextureRegion,
    TextureSource,
};
use super::error::AssetError;
use super::handle::{AssetHandle, AssetKey};
use super::loader::{self, LoadContext, LoadedAsset};
use super::path;
use crate::core::config::{CONFIG_FILENAME, LOCALIZATION_PATH, SCRIPTS_PATH};
use crate::platform::files::{self, FileLocation, FileSystem};
use crate::platform::image::{ColorFormat, Image, ImageCodec};
use crate::renderer::backend::{GpuResource, GraphicsBackend};

/// File name prefix of generated textures cached in app data.
pub const CACHED_TEXTURE_PREFIX: &str = ".gentexture_";

/// One registry key.
#[derive(Debug)]
struct Entry {
    key: AssetKey,
    /// Slots owned by this entry but not addressable by path (a font's texture).
    hidden: Vec<AssetKey>,
    /// Entries released together with this one (an atlas's regions).
    dependents: Vec<(String, AssetKey)>,
}

impl Entry {
    fn new(key: AssetKey) -> Self {
        Self {
            key,
            hidden: Vec::new(),
            dependents: Vec::new(),
        }
    }
}

pub struct Assets {
    files: Box<dyn FileSystem>,
    codec: Box<dyn ImageCodec>,
    suffix: String,
    texture_scale: f32,
    arena: SlotMap<AssetKey, Asset>,
    entries: HashMap<String, Entry>,
    /// GPU objects of unloaded assets, freed after the current frame.
    released: Vec<GpuResource>,
    cached_textures: u32,
}

impl Assets {
    /// `resolution_suffix` and `texture_scale` come from [`Sizes`](crate::core::sizes::Sizes)
    /// and stay fixed for the registry's lifetime.
    pub fn new(
        files: Box<dyn FileSystem>,
        codec: Box<dyn ImageCodec>,
        resolution_suffix: impl Into<String>,
        texture_scale: f32,
    ) -> Self {
        Self {
            files,
            codec,
            suffix: resolution_suffix.into(),
            texture_scale,
            arena: SlotMap::with_key(),
            entries: HashMap::new(),
            released: Vec::new(),
            cached_textures: 0,
        }
    }

    pub fn resolution_suffix(&self) -> &str {
        &self.suffix
    }

    pub fn texture_scale(&self) -> f32 {
        self.texture_scale
    }

    pub fn files(&self) -> &dyn FileSystem {
        self.files.as_ref()
    }

    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec.as_ref()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Registered keys, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn asset_type(&self, path: &str) -> Option<AssetType> {
        let entry = self.entries.get(path)?;
        self.arena.get(entry.key).map(Asset::asset_type)
    }

    /// Files and folders skipped by folder loads.
    fn is_ignored(&self, file: &str) -> bool {
        let trimmed = file.trim_matches('/');
        if trimmed == CONFIG_FILENAME || trimmed == SCRIPTS_PATH || trimmed == LOCALIZATION_PATH {
            return true;
        }
        if matches!(path::extension(trimmed), "atlas" | "font") {
            return true;
        }
        let suffix = path::suffix(trimmed);
        !suffix.is_empty() && suffix != self.suffix
    }

    /// Load every asset in the asset tree.
    pub fn load_all(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.load_folder("", true, gpu);
    }

    /// Load every asset in `folder`, descending into subfolders if `recursive`.
    ///
    /// Per-file failures are logged and skipped. When both `a.png` and
    /// `a@<active suffix>.png` exist, only the suffixed file is loaded.
    pub fn load_folder(&mut self, folder: &str, recursive: bool, gpu: &mut dyn GraphicsBackend) {
        if self.is_ignored(folder) {
            return;
        }
        if !self.files.is_directory(folder, FileLocation::Assets) {
            log::error!("Cannot load folder \"{folder}\": folder not found");
            return;
        }

        for name in self.files.file_list(folder, FileLocation::Assets) {
            let full = files::join(folder, &name);
            if self.files.is_file(&full, FileLocation::Assets) {
                if self.has_suffixed_variant(&full) {
                    log::debug!("Skipping \"{full}\" in favour of its @{} variant", self.suffix);
                    continue;
                }
                self.load_file(&full, gpu);
            } else if recursive {
                self.load_folder(&full, true, gpu);
            }
        }
    }

    fn has_suffixed_variant(&self, file: &str) -> bool {
        !self.suffix.is_empty()
            && path::suffix(file).is_empty()
            && self
                .files
                .is_file(&path::append_suffix(file, &self.suffix), FileLocation::Assets)
    }

    /// Load one concrete file (with extension, optionally suffixed).
    ///
    /// Returns `false` if the file is ignored, its key is already taken, no
    /// loader handles it, or the loader fails. Nothing is registered on failure.
    pub fn load_file(&mut self, file: &str, gpu: &mut dyn GraphicsBackend) -> bool {
        if self.is_ignored(file) {
            log::debug!("Ignoring \"{file}\"");
            return false;
        }
        match self.try_load_file(file, gpu) {
            Ok(key) => {
                log::debug!("Loaded \"{file}\" as \"{key}\"");
                true
            }
            Err(err) => {
                log::error!("Cannot load asset from file \"{file}\": {err}");
                false
            }
        }
    }

    fn try_load_file(&mut self, file: &str, gpu: &mut dyn GraphicsBackend) -> Result<String, AssetError> {
        let key = path::normalize(file);
        if self.entries.contains_key(&key) {
            return Err(AssetError::Duplicate(key));
        }
        let loader = loader::select_loader(self.files.as_ref(), file)
            .ok_or_else(|| AssetError::UnsupportedExtension(file.to_string()))?;

        let loaded = {
            let mut ctx = LoadContext {
                files: self.files.as_ref(),
                codec: self.codec.as_ref(),
                gpu,
                texture_scale: self.texture_scale,
            };
            loader.load(file, &mut ctx)?
        };
        self.commit(&key, loaded)?;
        Ok(key)
    }

    /// Register a staged load result under `key`, all or nothing.
    fn commit(&mut self, key: &str, loaded: LoadedAsset) -> Result<(), AssetError> {
        match loaded {
            LoadedAsset::Texture(texture) => {
                let slot = self.arena.insert(Asset::Texture(texture));
                self.entries.insert(key.to_string(), Entry::new(slot));
            }
            LoadedAsset::Atlas { texture, regions } => {
                let region_keys: Vec<String> =
                    regions.iter().map(|(name, _)| format!("{key}/{name}")).collect();
                if let Some(taken) = region_keys.iter().find(|k| self.entries.contains_key(*k)) {
                    self.released.push(GpuResource::Texture(texture.id()));
                    return Err(AssetError::Duplicate(taken.clone()));
                }

                let shape = texture.clone();
                let texture_slot = self.arena.insert(Asset::Texture(texture));
                let handle = AssetHandle::new(texture_slot);
                let mut entry = Entry::new(texture_slot);
                for (region_key, (_, rect)) in region_keys.into_iter().zip(regions) {
                    let region = TextureRegion::from_rect(handle, &shape, rect);
                    let slot = self.arena.insert(Asset::TextureRegion(region));
                    self.entries.insert(region_key.clone(), Entry::new(slot));
                    entry.dependents.push((region_key, slot));
                }
                self.entries.insert(key.to_string(), entry);
            }
            LoadedAsset::Font {
                texture,
                description,
            } => {
                let glyph = |metrics: &super::description::GlyphMetrics| {
                    Glyph::from_rect(&texture, metrics.rect, Vec2::new(metrics.offset_x, metrics.offset_y))
                };
                let glyphs = description
                    .glyphs
                    .iter()
                    .map(|(c, metrics)| (*c, glyph(metrics)))
                    .collect();
                let unknown = glyph(&description.unknown);

                let texture_slot = self.arena.insert(Asset::Texture(texture));
                let font = Font::new(
                    AssetHandle::new(texture_slot),
                    description.size,
                    self.texture_scale,
                    glyphs,
                    unknown,
                );
                let mut entry = Entry::new(self.arena.insert(Asset::Font(font)));
                entry.hidden.push(texture_slot);
                self.entries.insert(key.to_string(), entry);
            }
            LoadedAsset::Json(value) => {
                let slot = self.arena.insert(Asset::Json(JsonData(value)));
                self.entries.insert(key.to_string(), Entry::new(slot));
            }
        }
        Ok(())
    }

    /// Load a file by logical name (`"ui/button"`, no suffix).
    ///
    /// A file carrying the active resolution suffix is preferred; the
    /// unsuffixed file is the fallback. A name with an extension
    /// (`"ui/button.png"`) picks between exactly those two files.
    ///
    /// Lookup order is suffixed first, then plain. A plain file never
    /// shadows an existing `@suffix` variant of the same name.
    pub fn load(&mut self, name: &str, gpu: &mut dyn GraphicsBackend) -> bool {
        if !path::suffix(name).is_empty() {
            log::error!("Cannot load \"{name}\": filename must be specified without resolution suffix");
            return false;
        }
        match self.resolve_file(name) {
            Some(file) => self.load_file(&file, gpu),
            None => {
                log::error!("Cannot load \"{name}\": file not found");
                false
            }
        }
    }

    /// The concrete file [`load`](Self::load) would read for `name`.
    pub fn resolve_file(&self, name: &str) -> Option<String> {
        let files = self.files.as_ref();
        let assets = FileLocation::Assets;

        if !path::extension(name).is_empty() {
            let suffixed = path::append_suffix(name, &self.suffix);
            return [suffixed, name.to_string()]
                .into_iter()
                .find(|candidate| files.is_file(candidate, assets));
        }

        let (dir, base) = path::split_parent(name);
        let mut fallback = None;
        for entry in files.file_list(dir, assets) {
            if matches!(path::extension(&entry), "atlas" | "font") || path::normalize(&entry) != base {
                continue;
            }
            let candidate = files::join(dir, &entry);
            if !files.is_file(&candidate, assets) {
                continue;
            }
            let suffix = path::suffix(&entry);
            if suffix == self.suffix {
                return Some(candidate);
            }
            if suffix.is_empty() && fallback.is_none() {
                fallback = Some(candidate);
            }
        }
        fallback
    }

    fn remove_entry(&mut self, key: &str) {
        let Some(entry) = self.entries.remove(key) else {
            return;
        };
        for slot in std::iter::once(entry.key).chain(entry.hidden) {
            if let Some(asset) = self.arena.remove(slot) {
                self.queue_release(&asset);
            }
        }
        for (dependent, slot) in entry.dependents {
            // The dependent may have been unloaded and its key reused since.
            if self.entries.get(&dependent).is_some_and(|e| e.key == slot) {
                self.remove_entry(&dependent);
            }
        }
    }

    fn queue_release(&mut self, asset: &Asset) {
        let resource = match asset {
            Asset::Texture(texture) => GpuResource::Texture(texture.id()),
            Asset::Shader(shader) => GpuResource::Shader(shader.id()),
            Asset::FrameBuffer(framebuffer) => GpuResource::Framebuffer(framebuffer.id()),
            Asset::TextureRegion(_) | Asset::Font(_) | Asset::Json(_) => return,
        };
        self.released.push(resource);
    }

    /// Remove one entry. An atlas entry takes its regions with it.
    pub fn unload(&mut self, key: &str) {
        self.remove_entry(key);
    }

    /// Remove every entry whose key starts with `folder/`, plus the entry
    /// named `folder` itself if there is one.
    pub fn unload_folder(&mut self, folder: &str) {
        let prefix = path::folder_prefix(folder);
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in doomed {
            self.remove_entry(&key);
        }
        let folder_key = folder.trim_matches('/');
        if !folder_key.is_empty() {
            self.remove_entry(folder_key);
        }
    }

    /// Remove everything. Safe to call repeatedly.
    pub fn unload_all(&mut self) {
        let assets: Vec<Asset> = self.arena.drain().map(|(_, asset)| asset).collect();
        for asset in &assets {
            self.queue_release(asset);
        }
        self.entries.clear();
    }

    /// Handle to the asset at `key` if it exists and is a `T`; empty otherwise.
    pub fn get_asset_by_path<T: AssetKind>(&self, key: &str) -> AssetHandle<T> {
        self.entries
            .get(key)
            .filter(|entry| self.arena.get(entry.key).and_then(T::from_asset).is_some())
            .map(|entry| AssetHandle::new(entry.key))
            .unwrap_or_default()
    }

    pub fn get<T: AssetKind>(&self, handle: AssetHandle<T>) -> Option<&T> {
        self.arena.get(handle.key()).and_then(T::from_asset)
    }

    pub fn get_mut<T: AssetKind>(&mut self, handle: AssetHandle<T>) -> Option<&mut T> {
        self.arena.get_mut(handle.key()).and_then(T::from_asset_mut)
    }

    pub fn is_alive<T: AssetKind>(&self, handle: AssetHandle<T>) -> bool {
        self.get(handle).is_some()
    }

    fn reserve_key(&self, key: &str) -> bool {
        if key.is_empty() || self.entries.contains_key(key) {
            log::error!("Cannot register asset \"{key}\": key is empty or already loaded");
            return false;
        }
        true
    }

    /// Register a texture created from pixels at runtime. It survives
    /// context loss only after [`cache_texture`](Self::cache_texture).
    pub fn add_texture(&mut self, key: &str, image: &Image, gpu: &mut dyn GraphicsBackend) -> AssetHandle<Texture> {
        if !self.reserve_key(key) {
            return AssetHandle::empty();
        }
        match loader::upload_texture(gpu, image, self.texture_scale, TextureSource::Runtime) {
            Ok(texture) => {
                let slot = self.arena.insert(Asset::Texture(texture));
                self.entries.insert(key.to_string(), Entry::new(slot));
                AssetHandle::new(slot)
            }
            Err(err) => {
                log::error!("Cannot create texture \"{key}\": {err}");
                AssetHandle::empty()
            }
        }
    }

    /// Compile and register a shader program.
    pub fn add_shader(
        &mut self,
        key: &str,
        vertex_source: &str,
        fragment_source: &str,
        gpu: &mut dyn GraphicsBackend,
    ) -> AssetHandle<Shader> {
        if !self.reserve_key(key) {
            return AssetHandle::empty();
        }
        let Some(id) = gpu.compile_shader(vertex_source, fragment_source) else {
            log::error!("Cannot compile shader \"{key}\"");
            return AssetHandle::empty();
        };
        let shader = Shader::new(id, vertex_source.to_string(), fragment_source.to_string());
        let slot = self.arena.insert(Asset::Shader(shader));
        self.entries.insert(key.to_string(), Entry::new(slot));
        AssetHandle::new(slot)
    }

    /// Create and register an offscreen framebuffer with its own blank texture.
    pub fn add_framebuffer(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
        gpu: &mut dyn GraphicsBackend,
    ) -> AssetHandle<FrameBuffer> {
        if !self.reserve_key(key) {
            return AssetHandle::empty();
        }
        if width == 0 || height == 0 {
            log::error!("Cannot create framebuffer \"{key}\" of size {width}x{height}");
            return AssetHandle::empty();
        }
        let image = Image::new(width, height, ColorFormat::Rgba);
        let texture = match loader::upload_texture(gpu, &image, self.texture_scale, TextureSource::RenderTarget) {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("Cannot create framebuffer \"{key}\": {err}");
                return AssetHandle::empty();
            }
        };
        let Some(id) = gpu.create_framebuffer(texture.id()) else {
            log::error!("Cannot create framebuffer \"{key}\"");
            self.released.push(GpuResource::Texture(texture.id()));
            return AssetHandle::empty();
        };

        let texture_slot = self.arena.insert(Asset::Texture(texture));
        let framebuffer = FrameBuffer::new(id, AssetHandle::new(texture_slot), width, height);
        let mut entry = Entry::new(self.arena.insert(Asset::FrameBuffer(framebuffer)));
        entry.hidden.push(texture_slot);
        let handle = AssetHandle::new(entry.key);
        self.entries.insert(key.to_string(), entry);
        handle
    }

    /// Persist `image` as the content of `texture` in app data so the
    /// texture can be rebuilt after context loss. Returns the cache file name.
    pub fn cache_texture(&mut self, texture: AssetHandle<Texture>, image: &Image) -> Option<String> {
        let Some(current) = self.get(texture) else {
            log::error!("Cannot cache texture: texture has been unloaded");
            return None;
        };
        if (current.width(), current.height()) != (image.width(), image.height()) {
            log::error!(
                "Cannot cache texture: image is {}x{}, texture is {}x{}",
                image.width(),
                image.height(),
                current.width(),
                current.height()
            );
            return None;
        }
        let Some(bytes) = self.codec.encode(image) else {
            log::error!("Cannot cache texture: image encoding failed");
            return None;
        };

        let file = format!("{CACHED_TEXTURE_PREFIX}{}", self.cached_textures);
        if !self.files.write_file(&file, &bytes, FileLocation::AppData) {
            log::error!("Cannot cache texture: writing \"{file}\" failed");
            return None;
        }
        self.cached_textures += 1;
        if let Some(texture) = self.get_mut(texture) {
            texture.set_source(TextureSource::Cached(file.clone()));
        }
        Some(file)
    }

    /// Recreate every GPU object after context loss. Returns the number of
    /// assets that could not be restored (each is logged).
    pub fn reload_all(&mut self, gpu: &mut dyn GraphicsBackend) -> usize {
        // Handles queued for release belonged to the lost context.
        self.released.clear();

        let Self {
            arena, files, codec, ..
        } = self;
        let mut failed = 0;

        for asset in arena.values_mut() {
            let result = match asset {
                Asset::Texture(texture) => reload_texture(texture, files.as_ref(), codec.as_ref(), gpu),
                Asset::Shader(shader) => gpu
                    .compile_shader(shader.vertex_source(), shader.fragment_source())
                    .map(|id| shader.set_gpu(id))
                    .ok_or_else(|| AssetError::Gpu("shader recompilation".to_string())),
                _ => Ok(()),
            };
            if let Err(err) = result {
                log::error!("Asset reload failed: {err}");
                failed += 1;
            }
        }

        // Framebuffers bind to their already reloaded textures.
        let targets: Vec<(AssetKey, AssetKey)> = arena
            .iter()
            .filter_map(|(slot, asset)| match asset {
                Asset::FrameBuffer(fb) => Some((slot, fb.texture().key())),
                _ => None,
            })
            .collect();
        for (slot, texture_slot) in targets {
            let texture_id = match arena.get(texture_slot) {
                Some(Asset::Texture(texture)) => texture.id(),
                _ => {
                    log::error!("Asset reload failed: framebuffer texture is gone");
                    failed += 1;
                    continue;
                }
            };
            match (gpu.create_framebuffer(texture_id), arena.get_mut(slot)) {
                (Some(id), Some(Asset::FrameBuffer(fb))) => fb.set_gpu(id),
                _ => {
                    log::error!("Asset reload failed: cannot recreate framebuffer");
                    failed += 1;
                }
            }
        }

        log::info!("Reloaded {} assets, {failed} failed", arena.len());
        failed
    }

    /// GPU objects of unloaded assets waiting for the end of the frame.
    pub fn pending_releases(&self) -> usize {
        self.released.len()
    }

    pub fn take_released(&mut self) -> Vec<GpuResource> {
        std::mem::take(&mut self.released)
    }

    /// Free GPU objects of everything unloaded so far.
    pub fn release_gpu(&mut self, gpu: &mut dyn GraphicsBackend) {
        for resource in self.take_released() {
            gpu.release(resource);
        }
    }
}

fn reload_texture(
    texture: &mut Texture,
    files: &dyn FileSystem,
    codec: &dyn ImageCodec,
    gpu: &mut dyn GraphicsBackend,
) -> Result<(), AssetError> {
    let image = match texture.source() {
        TextureSource::File(file) => read_image(files, codec, file, FileLocation::Assets)?,
        TextureSource::Cached(file) => read_image(files, codec, file, FileLocation::AppData)?,
        TextureSource::RenderTarget => Image::new(texture.width(), texture.height(), texture.format()),
        TextureSource::Runtime => {
            return Err(AssetError::Reload(format!(
                "runtime texture {}x{}",
                texture.width(),
                texture.height()
            )))
        }
    };
    let id = gpu
        .create_texture(&image)
        .ok_or_else(|| AssetError::Gpu(format!("{}x{} texture", image.width(), image.height())))?;
    texture.set_gpu(id);
    Ok(())
}

fn read_image(
    files: &dyn FileSystem,
    codec: &dyn ImageCodec,
    file: &str,
    location: FileLocation,
) -> Result<Image, AssetError> {
    let bytes = files
        .read_file(file, location)
        .ok_or_else(|| AssetError::NotFound(file.to_string()))?;
    codec
        .decode(&bytes)
        .ok_or_else(|| AssetError::Decode(file.to_string()))
}
