//! Boundary to the scripting layer.
//!
//! The engine never talks to a script VM directly. A binding exposes script
//! tables as [`ScriptTable`] and callable values as [`ScriptFunction`]; the
//! engine only calls functions with positional [`ScriptValue`] arguments and
//! reads fields. Script-side failures come back as [`ScriptError`] and are
//! treated as no-ops by the caller.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::assets::Assets;
use crate::renderer::Renderer;

/// Value marshalled across the script boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
}

impl ScriptValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl From<f32> for ScriptValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for ScriptValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script error: {0}")]
    Runtime(String),
    #[error("bad argument #{index}: expected {expected}")]
    Argument { index: usize, expected: &'static str },
}

/// Deferred work run once after the current frame has been rendered.
pub type AfterRender = Box<dyn FnOnce(&mut Renderer, &mut Assets)>;

/// Engine services handed to a script callback for the duration of one call.
pub struct ScriptContext<'a> {
    pub renderer: &'a mut Renderer,
    pub assets: &'a mut Assets,
    after_render: &'a mut Vec<AfterRender>,
    next_scene: &'a mut Option<Rc<dyn ScriptTable>>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        renderer: &'a mut Renderer,
        assets: &'a mut Assets,
        after_render: &'a mut Vec<AfterRender>,
        next_scene: &'a mut Option<Rc<dyn ScriptTable>>,
    ) -> Self {
        Self {
            renderer,
            assets,
            after_render,
            next_scene,
        }
    }

    /// Run `action` once after the current frame ends.
    pub fn after_render(&mut self, action: impl FnOnce(&mut Renderer, &mut Assets) + 'static) {
        self.after_render.push(Box::new(action));
    }

    /// Switch to `scene` at the end of the current frame. A later request in
    /// the same frame replaces an earlier one.
    pub fn set_scene(&mut self, scene: Rc<dyn ScriptTable>) {
        *self.next_scene = Some(scene);
    }
}

pub trait ScriptFunction {
    fn call(&self, ctx: &mut ScriptContext<'_>, args: &[ScriptValue]) -> Result<(), ScriptError>;
}

impl<F> ScriptFunction for F
where
    F: Fn(&mut ScriptContext<'_>, &[ScriptValue]) -> Result<(), ScriptError>,
{
    fn call(&self, ctx: &mut ScriptContext<'_>, args: &[ScriptValue]) -> Result<(), ScriptError> {
        self(ctx, args)
    }
}

pub trait ScriptTable {
    /// Callable field `name`, if it exists and is a function.
    fn function(&self, name: &str) -> Option<Rc<dyn ScriptFunction>>;

    /// Plain field `name`; `None` for missing fields and functions.
    fn field(&self, name: &str) -> Option<ScriptValue>;
}

/// Table backed by Rust closures, for embedding without a VM and for tests.
#[derive(Default)]
pub struct MapTable {
    functions: HashMap<String, Rc<dyn ScriptFunction>>,
    fields: HashMap<String, ScriptValue>,
}

impl MapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: &str,
        function: impl Fn(&mut ScriptContext<'_>, &[ScriptValue]) -> Result<(), ScriptError> + 'static,
    ) -> Self {
        self.functions.insert(name.to_string(), Rc::new(function));
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<ScriptValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn into_rc(self) -> Rc<dyn ScriptTable> {
        Rc::new(self)
    }
}

impl ScriptTable for MapTable {
    fn function(&self, name: &str) -> Option<Rc<dyn ScriptFunction>> {
        self.functions.get(name).cloned()
    }

    fn field(&self, name: &str) -> Option<ScriptValue> {
        self.fields.get(name).cloned()
    }
}

impl fmt::Debug for MapTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        functions.sort_unstable();
        f.debug_struct("MapTable")
            .field("functions", &functions)
            .field("fields", &self.fields)
            .finish()
    }
}
