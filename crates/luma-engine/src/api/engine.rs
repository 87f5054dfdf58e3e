use std::rc::Rc;

use glam::Vec2;

use crate::assets::{AssetHandle, Assets, FrameBuffer};
use crate::bridge::script::ScriptTable;
use crate::core::config::Config;
use crate::core::graphics::Graphics;
use crate::core::sizes::{SafeArea, Sizes};
use crate::input::queue::TouchEvent;
use crate::platform::files::FileSystem;
use crate::platform::image::ImageCodec;
use crate::renderer::{GraphicsBackend, Renderer};

/// Collaborators and screen metrics supplied by the host at startup.
pub struct Platform {
    pub files: Box<dyn FileSystem>,
    pub codec: Box<dyn ImageCodec>,
    pub backend: Box<dyn GraphicsBackend>,
    /// Physical framebuffer size in pixels.
    pub screen_width: f32,
    pub screen_height: f32,
    pub safe_area: SafeArea,
}

/// Explicit engine context: configuration, screen metrics, the asset
/// registry and the graphics subsystem, built once and torn down on drop.
pub struct Engine {
    config: Config,
    sizes: Sizes,
    assets: Assets,
    graphics: Graphics,
}

impl Engine {
    pub fn new(platform: Platform) -> Self {
        let Platform {
            files,
            codec,
            backend,
            screen_width,
            screen_height,
            safe_area,
        } = platform;

        let config = Config::read(files.as_ref());
        let sizes = Sizes::new(screen_width, screen_height, safe_area, &config);

        let mut renderer = Renderer::new(backend, sizes.make_camera());
        renderer.set_background(config.background_color);
        log::info!("\"{}\" running on {} backend", config.name, renderer.backend().backend());

        let assets = Assets::new(files, codec, sizes.resolution_suffix(), sizes.texture_scale());
        Self {
            config,
            sizes,
            assets,
            graphics: Graphics::new(renderer),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sizes(&self) -> &Sizes {
        &self.sizes
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    pub fn renderer(&self) -> &Renderer {
        self.graphics.renderer()
    }

    /// Registry and GPU backend together, for loads and runtime asset creation.
    pub fn assets_and_gpu(&mut self) -> (&mut Assets, &mut dyn GraphicsBackend) {
        (&mut self.assets, self.graphics.renderer_mut().backend_mut())
    }

    /// Load the whole asset tree.
    pub fn load_all(&mut self) {
        let (assets, gpu) = self.assets_and_gpu();
        assets.load_all(gpu);
        log::info!("Loaded {} assets", self.assets.len());
    }

    /// Start with `scene`. Returns `false` if the scene was rejected.
    pub fn run(&mut self, scene: Rc<dyn ScriptTable>) -> bool {
        self.graphics.set_scene(scene, &mut self.assets)
    }

    /// One platform tick at monotonic time `now`, in seconds.
    pub fn on_update(&mut self, now: f64) {
        self.graphics.on_update(now, &mut self.assets);
    }

    pub fn on_pause(&mut self) {
        self.graphics.on_pause(&mut self.assets);
    }

    pub fn on_resume(&mut self) {
        self.graphics.on_resume(&mut self.assets);
    }

    /// Returns the number of assets that could not be restored.
    pub fn on_context_lost(&mut self) -> usize {
        self.graphics.on_context_lost(&mut self.assets)
    }

    pub fn push_touch(&mut self, event: TouchEvent) {
        self.graphics.push_touch(event);
    }

    /// Content-space position of a physical touch point (top-left origin).
    pub fn touch_to_content(&self, x: f32, y: f32) -> Vec2 {
        let camera = self.renderer().camera();
        camera.unproject(Vec2::new(x, camera.viewport().y - y))
    }

    /// Read back `framebuffer` and store its pixels so its texture survives a
    /// context loss. Returns the cache file name.
    pub fn cache_framebuffer(&mut self, framebuffer: AssetHandle<FrameBuffer>) -> Option<String> {
        let texture = self.assets.get(framebuffer)?.texture();
        let image = self
            .graphics
            .renderer_mut()
            .read_pixels(&self.assets, framebuffer)?;
        self.assets.cache_texture(texture, &image)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.assets.unload_all();
        let (assets, gpu) = self.assets_and_gpu();
        assets.release_gpu(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Texture;
    use crate::bridge::script::MapTable;
    use crate::platform::files::{FileLocation, MemoryFileSystem};
    use crate::platform::image::{ColorFormat, Image, RawCodec};
    use crate::renderer::{HeadlessBackend, HeadlessProbe};

    fn png(width: u32, height: u32) -> Vec<u8> {
        RawCodec
            .encode(&Image::new(width, height, ColorFormat::Rgba))
            .unwrap_or_default()
    }

    fn engine(files: MemoryFileSystem, width: f32, height: f32) -> (Engine, HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let engine = Engine::new(Platform {
            files: Box::new(files),
            codec: Box::new(RawCodec),
            backend: Box::new(backend),
            screen_width: width,
            screen_height: height,
            safe_area: SafeArea::default(),
        });
        (engine, probe)
    }

    #[test]
    fn startup_picks_resolution_from_config() {
        let files = MemoryFileSystem::new()
            .with_file(
                "config.json",
                r#"{"orientation": "landscape", "resolutions": ["HVGA", "HD"], "contentWidth": 480, "contentHeight": 320}"#,
            )
            .with_file("hero.png", png(4, 4))
            .with_file("hero@HD.png", png(8, 8));
        let (mut engine, _) = engine(files, 1280.0, 720.0);
        assert_eq!(engine.sizes().resolution_suffix(), "HD");
        assert_eq!(engine.assets().resolution_suffix(), "HD");

        engine.load_all();
        let hero = engine.assets().get_asset_by_path::<Texture>("hero");
        assert_eq!(engine.assets().get(hero).map(Texture::width), Some(8));
    }

    #[test]
    fn frame_runs_scene() {
        let (mut engine, probe) = engine(MemoryFileSystem::new(), 480.0, 320.0);
        let scene = MapTable::new()
            .with_function("onUpdate", |_, _| Ok(()))
            .with_function("onRender", |ctx, _| {
                ctx.renderer.render_line(Vec2::ZERO, Vec2::ONE, crate::renderer::Color::WHITE);
                Ok(())
            });
        assert!(engine.run(scene.into_rc()));
        engine.on_update(0.0);
        assert_eq!(probe.clears().len(), 1);
        assert_eq!(probe.draw_call_count(), 1);
    }

    #[test]
    fn touch_maps_to_content_space() {
        let (engine, _) = engine(MemoryFileSystem::new(), 480.0, 320.0);
        let pos = engine.touch_to_content(0.0, 320.0);
        assert!(pos.abs_diff_eq(Vec2::ZERO, 1e-3));
        let pos = engine.touch_to_content(480.0, 0.0);
        assert!(pos.abs_diff_eq(Vec2::new(480.0, 320.0), 1e-3));
    }

    #[test]
    fn cached_framebuffer_survives_context_loss() {
        let (mut engine, probe) = engine(MemoryFileSystem::new(), 480.0, 320.0);
        let (assets, gpu) = engine.assets_and_gpu();
        let fb = assets.add_framebuffer("canvas", 16, 16, gpu);
        assert!(!fb.is_empty());

        let cached = engine.cache_framebuffer(fb);
        assert!(cached.is_some());
        let name = cached.unwrap_or_default();
        assert!(engine.assets().files().is_file(&name, FileLocation::AppData));

        probe.lose_context();
        assert_eq!(engine.on_context_lost(), 0);
        let fb = engine.assets().get(fb).map(|f| f.id());
        assert!(fb.is_some_and(|id| probe.is_framebuffer_alive(id)));
    }
}
