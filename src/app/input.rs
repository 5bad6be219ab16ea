use crate::render::SurfaceSize;
use winit::event::{MouseScrollDelta, WindowEvent};

/// Pixels scrolled per wheel notch.
const LINE_HEIGHT_PX: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Scrolled { progress: f32 },
    Resized(SurfaceSize),
}

/// Turns window events into page scroll progress and viewport sizes.
#[derive(Debug, Clone)]
pub struct ScrollInput {
    scroll_y: f32,
    max_scroll: f32,
}

impl ScrollInput {
    pub fn new(max_scroll: f32) -> Self {
        Self {
            scroll_y: 0.0,
            max_scroll: max_scroll.max(0.0),
        }
    }

    pub fn set_max_scroll(&mut self, max_scroll: f32) {
        self.max_scroll = max_scroll.max(0.0);
        self.scroll_y = self.scroll_y.min(self.max_scroll);
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn progress(&self) -> f32 {
        if self.max_scroll <= 0.0 {
            0.0
        } else {
            self.scroll_y / self.max_scroll
        }
    }

    /// Returns the new progress, or `None` when the offset did not move.
    pub fn scroll_by(&mut self, delta_px: f32) -> Option<f32> {
        if !delta_px.is_finite() {
            return None;
        }
        let next = (self.scroll_y + delta_px).clamp(0.0, self.max_scroll);
        if next == self.scroll_y {
            return None;
        }
        self.scroll_y = next;
        Some(self.progress())
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<HostEvent> {
        match event {
            WindowEvent::Resized(size) => {
                Some(HostEvent::Resized(SurfaceSize::new(size.width, size.height)))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_px = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                self.scroll_by(delta_px)
                    .map(|progress| HostEvent::Scrolled { progress })
            }
            _ => None,
        }
    }
}
