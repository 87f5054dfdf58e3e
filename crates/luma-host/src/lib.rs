//! Native host for LumaEngine: assets from disk, `env_logger` output and a
//! frame loop driven by the monotonic clock.

pub mod files;
pub mod runner;

pub use files::DiskFileSystem;
pub use runner::HostRunner;

/// Install `env_logger`. `RUST_LOG` overrides the default `info` level.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
