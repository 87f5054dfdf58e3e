//! Host-provided collaborators: file access and image codecs.

pub mod files;
pub mod image;
#[cfg(feature = "png")]
pub mod png;

pub use self::files::{FileLocation, FileSystem, MemoryFileSystem};
pub use self::image::{ColorFormat, Image, ImageCodec, PixelRect, RawCodec};
#[cfg(feature = "png")]
pub use png::PngCodec;
