pub mod config;
pub mod graphics;
pub mod scene;
pub mod sizes;
pub mod time;

pub use config::{Config, Orientation, ScaleMode};
pub use graphics::Graphics;
pub use scene::Scenes;
pub use sizes::{SafeArea, Sizes};
pub use time::FrameClock;
