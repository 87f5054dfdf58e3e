//! Per-frame driver.
//!
//! One call to [`Graphics::on_update`] is one frame: timing, touch dispatch,
//! the scene's update and render callbacks around a renderer frame, then the
//! deferred work queued during the frame.

use std::rc::Rc;

use glam::Vec2;

use super::scene::Scenes;
use super::time::FrameClock;
use crate::assets::Assets;
use crate::bridge::script::{AfterRender, ScriptContext, ScriptTable};
use crate::input::queue::{TouchEvent, TouchPhase, TouchQueue};
use crate::renderer::Renderer;

pub struct Graphics {
    renderer: Renderer,
    scenes: Scenes,
    clock: FrameClock,
    touches: TouchQueue,
    after_render: Vec<AfterRender>,
    next_scene: Option<Rc<dyn ScriptTable>>,
    paused: bool,
}

impl Graphics {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            scenes: Scenes::new(),
            clock: FrameClock::new(),
            touches: TouchQueue::new(),
            after_render: Vec::new(),
            next_scene: None,
            paused: false,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn scenes(&self) -> &Scenes {
        &self.scenes
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn fps(&self) -> u32 {
        self.clock.fps()
    }

    /// Smoothed frame delta, the value scenes receive in `onUpdate`.
    pub fn delta_time(&self) -> f32 {
        self.clock.smoothed_delta()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Queue a platform touch for the next frame.
    pub fn push_touch(&mut self, event: TouchEvent) {
        self.touches.push(event);
    }

    /// Run `action` once after the next rendered frame.
    pub fn after_render(&mut self, action: impl FnOnce(&mut Renderer, &mut Assets) + 'static) {
        self.after_render.push(Box::new(action));
    }

    /// Switch scenes immediately. Use outside a frame (startup, host code);
    /// scripts request a switch through [`ScriptContext::set_scene`].
    pub fn set_scene(&mut self, scene: Rc<dyn ScriptTable>, assets: &mut Assets) -> bool {
        let Self {
            renderer,
            scenes,
            after_render,
            next_scene,
            ..
        } = self;
        let mut ctx = ScriptContext::new(renderer, assets, after_render, next_scene);
        scenes.set_scene(scene, &mut ctx)
    }

    /// Run one frame at platform time `now` (seconds, monotonic).
    pub fn on_update(&mut self, now: f64, assets: &mut Assets) {
        if self.paused {
            log::debug!("Frame skipped while paused");
            return;
        }
        self.clock.tick(now);
        let dt = self.clock.smoothed_delta();

        let Self {
            renderer,
            scenes,
            touches,
            after_render,
            next_scene,
            ..
        } = self;
        let touches = touches.drain();
        {
            let mut ctx = ScriptContext::new(renderer, assets, after_render, next_scene);

            for touch in touches {
                let pos = screen_to_content(ctx.renderer, touch.pos);
                match touch.phase {
                    TouchPhase::Down => scenes.on_touch_down(&mut ctx, pos, touch.index),
                    TouchPhase::Moved => scenes.on_touch_moved(&mut ctx, pos, touch.index),
                    TouchPhase::Up => scenes.on_touch_up(&mut ctx, pos, touch.index),
                }
            }

            scenes.on_update(&mut ctx, dt);

            ctx.renderer.begin_render();
            scenes.on_render(&mut ctx);
            ctx.renderer.end_render();
        }

        for action in std::mem::take(after_render) {
            action(renderer, assets);
        }
        assets.release_gpu(renderer.backend_mut());

        if let Some(scene) = next_scene.take() {
            let mut ctx = ScriptContext::new(renderer, assets, after_render, next_scene);
            scenes.set_scene(scene, &mut ctx);
        }
    }

    pub fn on_pause(&mut self, assets: &mut Assets) {
        if self.paused {
            return;
        }
        self.paused = true;
        let Self {
            renderer,
            scenes,
            after_render,
            next_scene,
            ..
        } = self;
        scenes.on_pause(&mut ScriptContext::new(renderer, assets, after_render, next_scene));
    }

    pub fn on_resume(&mut self, assets: &mut Assets) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.clock.reset();
        let Self {
            renderer,
            scenes,
            after_render,
            next_scene,
            ..
        } = self;
        scenes.on_resume(&mut ScriptContext::new(renderer, assets, after_render, next_scene));
    }

    /// Rebuild GPU state after the platform lost the graphics context.
    /// Returns the number of assets that could not be restored.
    pub fn on_context_lost(&mut self, assets: &mut Assets) -> usize {
        log::info!("Graphics context lost, reloading assets");
        self.renderer.reload_default_shader();
        assets.reload_all(self.renderer.backend_mut())
    }
}

/// Platform touch position (physical pixels, top-left origin) to content space.
fn screen_to_content(renderer: &Renderer, pos: Vec2) -> Vec2 {
    let camera = renderer.camera();
    camera.unproject(Vec2::new(pos.x, camera.viewport().y - pos.y))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::bridge::script::{MapTable, ScriptError, ScriptValue};
    use crate::platform::files::MemoryFileSystem;
    use crate::platform::image::RawCodec;
    use crate::renderer::{Camera, Color, HeadlessBackend, HeadlessProbe, Material, Quad, UvRect};

    type Log = Rc<RefCell<Vec<String>>>;

    fn setup() -> (Graphics, Assets, HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let mut camera = Camera::new(100.0, 100.0, Vec2::new(200.0, 200.0));
        camera.set_pos(Vec2::new(50.0, 50.0));
        let graphics = Graphics::new(Renderer::new(Box::new(backend), camera));
        let assets = Assets::new(Box::new(MemoryFileSystem::new()), Box::new(RawCodec), "", 1.0);
        (graphics, assets, probe)
    }

    fn logging(log: &Log, tag: &'static str) -> impl Fn(&mut ScriptContext<'_>, &[ScriptValue]) -> Result<(), ScriptError> {
        let log = Rc::clone(log);
        move |ctx: &mut ScriptContext<'_>, args: &[ScriptValue]| {
            let args: Vec<String> = args
                .iter()
                .map(|a| a.as_f64().map_or_else(|| format!("{a:?}"), |v| format!("{v}")))
                .collect();
            log.borrow_mut()
                .push(format!("{tag}({}) in_progress={}", args.join(","), ctx.renderer.is_in_progress()));
            Ok(())
        }
    }

    fn scene(log: &Log) -> MapTable {
        MapTable::new()
            .with_function("onUpdate", logging(log, "update"))
            .with_function("onRender", logging(log, "render"))
            .with_function("onPause", logging(log, "pause"))
            .with_function("onResume", logging(log, "resume"))
            .with_function("onTouchDown", logging(log, "down"))
    }

    #[test]
    fn frame_order() {
        let log = Log::default();
        let (mut graphics, mut assets, _) = setup();
        assert!(graphics.set_scene(scene(&log).into_rc(), &mut assets));

        graphics.push_touch(TouchEvent::new(TouchPhase::Down, 100.0, 150.0, 1));
        graphics.on_update(0.0, &mut assets);
        assert_eq!(
            *log.borrow(),
            [
                "down(50,25,1) in_progress=false",
                "update(0) in_progress=false",
                "render() in_progress=true",
            ]
        );
    }

    #[test]
    fn update_receives_smoothed_delta() {
        let log = Log::default();
        let (mut graphics, mut assets, _) = setup();
        let table = MapTable::new().with_function("onUpdate", logging(&log, "update"));
        graphics.set_scene(table.into_rc(), &mut assets);

        for now in [0.0, 0.016, 0.032, 0.132] {
            graphics.on_update(now, &mut assets);
        }
        assert_eq!(graphics.clock().delta(), crate::core::time::MAX_DELTA);
        let spike = graphics.delta_time();
        assert!(spike > 0.012 && spike < 0.014, "spike not damped: {spike}");

        let last = log.borrow().last().cloned().unwrap_or_default();
        let passed: f32 = last
            .trim_start_matches("update(")
            .split(')')
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(f32::MAX);
        assert!((passed - spike).abs() < 1e-6);
    }

    #[test]
    fn scene_draws_through_context() {
        let (mut graphics, mut assets, probe) = setup();
        let table = MapTable::new()
            .with_function("onUpdate", |_, _| Ok(()))
            .with_function("onRender", |ctx, _| {
                let quad = Quad::rect(Vec2::ZERO, Vec2::splat(10.0), UvRect::FULL);
                ctx.renderer.render_quad(ctx.assets, &Material::solid(), &quad, Color::WHITE);
                Ok(())
            });
        graphics.set_scene(table.into_rc(), &mut assets);
        graphics.on_update(0.0, &mut assets);
        assert_eq!(probe.draw_call_count(), 1);
        assert_eq!(graphics.renderer().stats().render_calls, 1);
    }

    #[test]
    fn after_render_runs_once() {
        let (mut graphics, mut assets, _) = setup();
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        graphics.after_render(move |renderer, _| {
            assert!(!renderer.is_in_progress());
            *counter.borrow_mut() += 1;
        });
        graphics.on_update(0.0, &mut assets);
        graphics.on_update(0.016, &mut assets);
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn unloaded_gpu_objects_released_after_frame() {
        let (mut graphics, mut assets, probe) = setup();
        let image = crate::platform::image::Image::new(2, 2, crate::platform::image::ColorFormat::Rgba);
        let texture = assets.add_texture("tmp", &image, graphics.renderer_mut().backend_mut());
        let id = assets.get(texture).map(|t| t.id());
        assets.unload("tmp");
        assert!(probe.is_texture_alive(id.unwrap()));
        graphics.on_update(0.0, &mut assets);
        assert!(!probe.is_texture_alive(id.unwrap()));
    }

    #[test]
    fn scene_switch_requested_by_script_applies_after_frame() {
        let log = Log::default();
        let (mut graphics, mut assets, _) = setup();
        let next = scene(&log).into_rc();
        let first = MapTable::new()
            .with_function("onUpdate", move |ctx, _| {
                ctx.set_scene(Rc::clone(&next));
                Ok(())
            })
            .with_function("onRender", logging(&log, "first.render"));
        graphics.set_scene(first.into_rc(), &mut assets);

        graphics.on_update(0.0, &mut assets);
        assert_eq!(*log.borrow(), ["first.render() in_progress=true"]);

        log.borrow_mut().clear();
        graphics.on_update(0.016, &mut assets);
        assert_eq!(log.borrow()[1], "render() in_progress=true");
    }

    #[test]
    fn pause_and_resume() {
        let log = Log::default();
        let (mut graphics, mut assets, _) = setup();
        graphics.set_scene(scene(&log).into_rc(), &mut assets);
        graphics.on_update(0.0, &mut assets);
        log.borrow_mut().clear();

        graphics.on_pause(&mut assets);
        graphics.on_pause(&mut assets);
        graphics.on_update(1.0, &mut assets);
        graphics.on_resume(&mut assets);
        graphics.on_update(30.0, &mut assets);

        let log = log.borrow();
        assert_eq!(log[0], "pause() in_progress=false");
        assert_eq!(log[1], "resume() in_progress=false");
        assert_eq!(log[2], "update(0) in_progress=false");
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn context_loss_restores_shader() {
        let (mut graphics, mut assets, probe) = setup();
        probe.lose_context();
        assert_eq!(graphics.on_context_lost(&mut assets), 0);
        let shader = graphics.renderer().default_shader();
        assert!(shader.is_some_and(|s| probe.is_shader_alive(s)));
    }
}
