use std::rc::Rc;

use glam::Vec2;

use crate::bridge::script::{ScriptContext, ScriptFunction, ScriptTable, ScriptValue};

type Callback = Option<Rc<dyn ScriptFunction>>;

/// Callbacks cached from the active scene table.
#[derive(Default)]
struct SceneCallbacks {
    update: Callback,
    render: Callback,
    pause: Callback,
    resume: Callback,
    touch_down: Callback,
    touch_moved: Callback,
    touch_up: Callback,
}

impl SceneCallbacks {
    fn from_table(table: &dyn ScriptTable) -> Self {
        Self {
            update: table.function("onUpdate"),
            render: table.function("onRender"),
            pause: table.function("onPause"),
            resume: table.function("onResume"),
            touch_down: table.function("onTouchDown"),
            touch_moved: table.function("onTouchMoved"),
            touch_up: table.function("onTouchUp"),
        }
    }
}

/// Holder of the active scene table.
///
/// A scene must provide `onUpdate` and `onRender`; `onEnter`, `onLeave`,
/// `onPause`, `onResume` and the `onTouch*` callbacks are optional.
#[derive(Default)]
pub struct Scenes {
    current: Option<Rc<dyn ScriptTable>>,
    callbacks: SceneCallbacks,
}

impl Scenes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_scene(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<Rc<dyn ScriptTable>> {
        self.current.clone()
    }

    /// Make `scene` active. An invalid scene is rejected and the previous
    /// one stays active.
    pub fn set_scene(&mut self, scene: Rc<dyn ScriptTable>, ctx: &mut ScriptContext<'_>) -> bool {
        for required in ["onUpdate", "onRender"] {
            if scene.function(required).is_none() {
                log::error!("Scene has no \"{required}\" method");
                return false;
            }
        }

        if let Some(previous) = self.current.take() {
            call(&previous.function("onLeave"), "onLeave", ctx, &[]);
        }
        call(&scene.function("onEnter"), "onEnter", ctx, &[]);

        self.callbacks = SceneCallbacks::from_table(scene.as_ref());
        self.current = Some(scene);
        true
    }

    pub fn on_update(&self, ctx: &mut ScriptContext<'_>, dt: f32) {
        call(&self.callbacks.update, "onUpdate", ctx, &[dt.into()]);
    }

    pub fn on_render(&self, ctx: &mut ScriptContext<'_>) {
        call(&self.callbacks.render, "onRender", ctx, &[]);
    }

    pub fn on_pause(&self, ctx: &mut ScriptContext<'_>) {
        call(&self.callbacks.pause, "onPause", ctx, &[]);
    }

    pub fn on_resume(&self, ctx: &mut ScriptContext<'_>) {
        call(&self.callbacks.resume, "onResume", ctx, &[]);
    }

    /// Touch callbacks receive content-space `x`, `y` and the touch index.
    pub fn on_touch_down(&self, ctx: &mut ScriptContext<'_>, pos: Vec2, index: u32) {
        call(&self.callbacks.touch_down, "onTouchDown", ctx, &touch_args(pos, index));
    }

    pub fn on_touch_moved(&self, ctx: &mut ScriptContext<'_>, pos: Vec2, index: u32) {
        call(&self.callbacks.touch_moved, "onTouchMoved", ctx, &touch_args(pos, index));
    }

    pub fn on_touch_up(&self, ctx: &mut ScriptContext<'_>, pos: Vec2, index: u32) {
        call(&self.callbacks.touch_up, "onTouchUp", ctx, &touch_args(pos, index));
    }
}

fn touch_args(pos: Vec2, index: u32) -> [ScriptValue; 3] {
    [pos.x.into(), pos.y.into(), index.into()]
}

fn call(callback: &Callback, name: &str, ctx: &mut ScriptContext<'_>, args: &[ScriptValue]) {
    if let Some(function) = callback {
        if let Err(err) = function.call(ctx, args) {
            log::debug!("Scene callback \"{name}\" failed: {err}");
        }
    }
}
