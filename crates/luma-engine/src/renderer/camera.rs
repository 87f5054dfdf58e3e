use std::cell::Cell;

use glam::{Mat4, Vec2};

/// Orthographic 2D camera.
///
/// `width`/`height` are the visible area in points at zoom 1; `viewport` is
/// the physical framebuffer size in pixels. The view-projection matrix is
/// rebuilt lazily after a position or zoom change.
///
/// Mutating a camera owned by a [`Renderer`](super::Renderer) goes through
/// [`Renderer::camera_mut`](super::Renderer::camera_mut), which flushes the
/// pending batch first.
#[derive(Debug, Clone)]
pub struct Camera {
    width: f32,
    height: f32,
    viewport: Vec2,
    pos: Vec2,
    zoom: f32,
    matrix: Cell<Option<Mat4>>,
}

impl Camera {
    pub fn new(width: f32, height: f32, viewport: Vec2) -> Self {
        Self {
            width,
            height,
            viewport,
            pos: Vec2::ZERO,
            zoom: 1.0,
            matrix: Cell::new(None),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Camera center in content space.
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
        self.matrix.set(None);
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.set_pos(self.pos + offset);
    }

    /// Zoom factor; 2.0 shows half the area at twice the size.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() || zoom <= 0.0 {
            log::error!("Camera zoom must be positive, got {zoom}");
            return;
        }
        self.zoom = zoom;
        self.matrix.set(None);
    }

    /// Visible half-extents in content units at the current zoom.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / (2.0 * self.zoom)
    }

    /// Orthographic projection centered on `pos`, Y-up, Z in [-1, 1].
    pub fn matrix(&self) -> Mat4 {
        if let Some(matrix) = self.matrix.get() {
            return matrix;
        }
        let half = self.half_extents();
        let matrix = Mat4::orthographic_rh_gl(
            self.pos.x - half.x,
            self.pos.x + half.x,
            self.pos.y - half.y,
            self.pos.y + half.y,
            -1.0,
            1.0,
        );
        self.matrix.set(Some(matrix));
        matrix
    }

    /// Content-space point to physical pixels (origin bottom-left).
    pub fn project(&self, point: Vec2) -> Vec2 {
        let ndc = self.matrix().project_point3(point.extend(0.0));
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (ndc.y + 1.0) * 0.5 * self.viewport.y,
        )
    }

    /// Physical pixels (origin bottom-left) to content space.
    pub fn unproject(&self, screen: Vec2) -> Vec2 {
        let ndc = Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            screen.y / self.viewport.y * 2.0 - 1.0,
        );
        self.matrix()
            .inverse()
            .project_point3(ndc.extend(0.0))
            .truncate()
    }

    /// Check if a content-space point is inside the visible area.
    pub fn is_visible(&self, point: Vec2) -> bool {
        let delta = (point - self.pos).abs();
        let half = self.half_extents();
        delta.x <= half.x && delta.y <= half.y
    }

    /// Check if a content-space rectangle overlaps the visible area.
    pub fn is_rect_visible(&self, rect_center: Vec2, rect_half_size: Vec2) -> bool {
        let delta = (rect_center - self.pos).abs();
        let reach = self.half_extents() + rect_half_size;
        delta.x <= reach.x && delta.y <= reach.y
    }
}
