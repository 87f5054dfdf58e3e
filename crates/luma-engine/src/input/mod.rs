pub mod queue;

pub use queue::{TouchEvent, TouchPhase, TouchQueue};
