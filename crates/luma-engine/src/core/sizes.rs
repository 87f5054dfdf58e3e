//! Screen metrics and resolution bucket selection, computed once at startup.
//!
//! Three coordinate spaces are involved:
//! - physical pixels of the framebuffer,
//! - points: the logical screen (`screen_width` x `screen_height`),
//! - content: the designed game area, placed inside the screen.
//!
//! Content coordinates have their origin at the content area's bottom-left
//! corner and share the points unit.

use glam::Vec2;

use super::config::{Config, Orientation, ScaleMode, DEFAULT_RESOLUTION};
use crate::renderer::camera::Camera;

/// Height every texture scale is relative to.
pub const BASE_SIZE: f32 = 320.0;

/// Resolution buckets and their canonical heights.
pub const RESOLUTIONS: &[(&str, u32)] = &[
    ("HVGA", 320),
    ("WVGA", 480),
    ("qHD", 540),
    ("HD", 720),
    ("FullHD", 1080),
    ("WSVGA", 600),
    ("WXGA", 800),
    ("Retina iPad", 1536),
    ("WQXGA", 1600),
];

pub fn height_for_resolution(name: &str) -> Option<u32> {
    RESOLUTIONS
        .iter()
        .find(|(bucket, _)| *bucket == name)
        .map(|(_, height)| *height)
}

/// Bucket whose canonical height is closest to `physical_dimension`. Ties
/// go to the earliest bucket; unknown names are skipped.
pub fn select_resolution<'a, S: AsRef<str>>(physical_dimension: f32, resolutions: &'a [S]) -> Option<&'a str> {
    let mut best: Option<(&str, f32)> = None;
    for name in resolutions {
        let name = name.as_ref();
        let Some(height) = height_for_resolution(name) else {
            continue;
        };
        let diff = (physical_dimension - height as f32).abs();
        if best.map_or(true, |(_, min)| diff < min) {
            best = Some((name, diff));
        }
    }
    best.map(|(name, _)| name)
}

/// Platform-reported insets (status bar, notch), in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafeArea {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sizes {
    physical: Vec2,
    safe_area: SafeArea,
    scale_mode: ScaleMode,
    resolution: String,
    texture_scale: f32,
    /// Physical pixels per point.
    scale_factor: f32,
    screen: Vec2,
    content: Vec2,
    content_offset: Vec2,
}

impl Sizes {
    pub fn new(physical_width: f32, physical_height: f32, safe_area: SafeArea, config: &Config) -> Self {
        let physical = Vec2::new(physical_width.max(1.0), physical_height.max(1.0));

        let dimension = match config.orientation {
            Orientation::Portrait => physical.x,
            Orientation::Landscape => physical.y,
        };
        let resolution = select_resolution(dimension, &config.resolutions)
            .unwrap_or_else(|| {
                log::error!("No supported resolution configured, using \"{DEFAULT_RESOLUTION}\"");
                DEFAULT_RESOLUTION
            })
            .to_string();
        let texture_scale = BASE_SIZE / height_for_resolution(&resolution).unwrap_or(BASE_SIZE as u32) as f32;

        let mut sizes = Self {
            physical,
            safe_area,
            scale_mode: config.scale_mode,
            resolution,
            texture_scale,
            scale_factor: 1.0,
            screen: physical,
            content: Vec2::new(config.content_width, config.content_height).max(Vec2::ONE),
            content_offset: Vec2::ZERO,
        };
        sizes.apply_scale_mode(config.scale_mode);
        log::info!(
            "Resolution \"{}\" (texture scale {}), screen {}x{} points, content {}x{}",
            sizes.resolution,
            sizes.texture_scale,
            sizes.screen.x,
            sizes.screen.y,
            sizes.content.x,
            sizes.content.y
        );
        sizes
    }

    fn safe_size(&self) -> Vec2 {
        let insets = Vec2::new(
            self.safe_area.left + self.safe_area.right,
            self.safe_area.top + self.safe_area.bottom,
        );
        (self.physical - insets).max(Vec2::ONE)
    }

    fn apply_scale_mode(&mut self, mode: ScaleMode) {
        let safe = self.safe_size();
        let fit = (safe.x / self.content.x).min(safe.y / self.content.y);

        match mode {
            ScaleMode::Stretch => self.content = safe / fit,
            ScaleMode::Fit => {}
            ScaleMode::Adaptive => {
                let content_aspect = self.content.x / self.content.y;
                let safe_aspect = safe.x / safe.y;
                let resolved = if content_aspect <= safe_aspect {
                    ScaleMode::Stretch
                } else {
                    ScaleMode::Fit
                };
                return self.apply_scale_mode(resolved);
            }
        }

        self.scale_factor = fit;
        self.screen = self.physical / fit;
        let safe_origin = Vec2::new(self.safe_area.left, self.safe_area.bottom) / fit;
        self.content_offset = safe_origin + (safe / fit - self.content) / 2.0;
    }

    /// Camera showing the whole screen, positioned in content coordinates.
    pub fn make_camera(&self) -> Camera {
        let mut camera = Camera::new(self.screen.x, self.screen.y, self.physical);
        camera.set_pos(self.screen / 2.0 - self.content_offset);
        camera
    }

    pub fn resolution_suffix(&self) -> &str {
        &self.resolution
    }

    /// Points per texture pixel: `BASE_SIZE / height(resolution)`.
    pub fn texture_scale(&self) -> f32 {
        self.texture_scale
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn physical_width(&self) -> f32 {
        self.physical.x
    }

    pub fn physical_height(&self) -> f32 {
        self.physical.y
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.physical.x / self.physical.y
    }

    pub fn screen_width(&self) -> f32 {
        self.screen.x
    }

    pub fn screen_height(&self) -> f32 {
        self.screen.y
    }

    pub fn content_width(&self) -> f32 {
        self.content.x
    }

    pub fn content_height(&self) -> f32 {
        self.content.y
    }

    /// Bottom-left corner of the content area in screen points.
    pub fn content_offset(&self) -> Vec2 {
        self.content_offset
    }

    pub fn safe_area(&self) -> SafeArea {
        self.safe_area
    }
}
