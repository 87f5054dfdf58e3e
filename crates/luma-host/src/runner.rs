use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use luma_engine::{Engine, HeadlessBackend, HeadlessProbe, Platform, SafeArea, ScriptTable, TouchEvent};

use crate::files::DiskFileSystem;

/// Drives an [`Engine`] from a monotonic clock.
///
/// The host owns the platform loop; each call to [`HostRunner::tick`] is one
/// frame. Pause and resume are forwarded as-is.
pub struct HostRunner {
    engine: Engine,
    started: Instant,
    frames: u64,
}

impl HostRunner {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            started: Instant::now(),
            frames: 0,
        }
    }

    /// Engine over the asset and app-data directories, rendering into a
    /// recording backend. Used for tooling and smoke runs without a window.
    #[cfg(feature = "png")]
    pub fn headless(
        assets: impl Into<PathBuf>,
        app_data: impl Into<PathBuf>,
        screen_width: f32,
        screen_height: f32,
    ) -> (Self, HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let engine = Engine::new(Platform {
            files: Box::new(DiskFileSystem::new(assets, app_data)),
            codec: Box::new(luma_engine::PngCodec),
            backend: Box::new(backend),
            screen_width,
            screen_height,
            safe_area: SafeArea::default(),
        });
        (Self::new(engine), probe)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Load every asset and start `scene`.
    pub fn start(&mut self, scene: Rc<dyn ScriptTable>) -> bool {
        self.engine.load_all();
        if !self.engine.run(scene) {
            log::error!("Initial scene rejected");
            return false;
        }
        self.started = Instant::now();
        true
    }

    /// One frame at the current wall-clock time.
    pub fn tick(&mut self) {
        let now = self.started.elapsed().as_secs_f64();
        self.tick_at(now);
    }

    /// One frame at `now` seconds since start.
    pub fn tick_at(&mut self, now: f64) {
        self.engine.on_update(now);
        self.frames += 1;
    }

    /// Tick `count` frames spaced `dt` seconds apart, starting after the
    /// last simulated time.
    pub fn run_frames(&mut self, count: u32, dt: f64) {
        let base = self.frames as f64 * dt;
        for i in 0..count {
            self.tick_at(base + f64::from(i) * dt);
        }
        log::debug!("Ran {count} frames, {} fps", self.engine.graphics().fps());
    }

    pub fn push_touch(&mut self, event: TouchEvent) {
        self.engine.push_touch(event);
    }

    pub fn pause(&mut self) {
        self.engine.on_pause();
    }

    pub fn resume(&mut self) {
        self.engine.on_resume();
    }
}

#[cfg(all(test, feature = "png"))]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use luma_engine::{ColorFormat, Image, ImageCodec, MapTable, PngCodec, ScriptValue, Texture, TouchPhase};

    use super::*;

    fn assets_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"orientation": "landscape", "resolutions": ["HVGA"], "contentWidth": 480, "contentHeight": 320}"#,
        )
        .unwrap();
        let png = PngCodec
            .encode(&Image::new(4, 2, ColorFormat::Rgba))
            .unwrap();
        fs::create_dir_all(dir.path().join("ui")).unwrap();
        fs::write(dir.path().join("ui/button.png"), png).unwrap();
        dir
    }

    #[test]
    fn runs_scene_from_disk() {
        let assets = assets_dir();
        let data = tempfile::tempdir().unwrap();
        let (mut runner, probe) = HostRunner::headless(assets.path(), data.path(), 480.0, 320.0);

        let updates = Rc::new(Cell::new(0));
        let touches = Rc::new(Cell::new(0));
        let counted = Rc::clone(&updates);
        let touched = Rc::clone(&touches);
        let scene = MapTable::new()
            .with_function("onUpdate", move |_, _: &[ScriptValue]| {
                counted.set(counted.get() + 1);
                Ok(())
            })
            .with_function("onRender", |_, _| Ok(()))
            .with_function("onTouchDown", move |_, _: &[ScriptValue]| {
                touched.set(touched.get() + 1);
                Ok(())
            });
        assert!(runner.start(scene.into_rc()));

        let button = runner.engine().assets().get_asset_by_path::<Texture>("ui/button");
        assert_eq!(runner.engine().assets().get(button).map(Texture::width), Some(4));

        runner.push_touch(TouchEvent::new(TouchPhase::Down, 10.0, 10.0, 0));
        runner.run_frames(3, 1.0 / 60.0);
        assert_eq!(runner.frames(), 3);
        assert_eq!(updates.get(), 3);
        assert_eq!(touches.get(), 1);
        assert_eq!(probe.clears().len(), 3);

        runner.pause();
        runner.tick();
        assert_eq!(updates.get(), 3);
        runner.resume();
        runner.tick();
        assert_eq!(updates.get(), 4);
    }
}
