pub mod script;

pub use script::{
    AfterRender, MapTable, ScriptContext, ScriptError, ScriptFunction, ScriptTable, ScriptValue,
};
