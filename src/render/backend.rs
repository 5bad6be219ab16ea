use super::{FramePlan, PassConfig, PassKind, RenderError, SurfaceSize, ToneMapping};
use crate::scene::variants::DrawItem;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(pub u32);

/// Rasterizer/compositor the pipeline drives. Implementations own the
/// per-pass buffers; the pipeline owns configuration and ordering.
pub trait RenderBackend {
    fn create_pass(&mut self, config: &PassConfig, size: SurfaceSize) -> PassId;
    fn set_size(&mut self, size: SurfaceSize);
    fn resize_pass(&mut self, pass: PassId, size: SurfaceSize);
    fn render(&mut self, frame: &FramePlan) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPass {
    pub kind: PassKind,
    pub config: PassConfig,
    pub draws: Vec<DrawItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub size: SurfaceSize,
    pub tone_mapping: ToneMapping,
    pub passes: Vec<RecordedPass>,
}

/// Backend that keeps every frame in memory instead of rasterizing.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    size: SurfaceSize,
    pass_sizes: HashMap<PassId, SurfaceSize>,
    next_pass: u32,
    frames: Vec<RecordedFrame>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pass_size(&self, pass: PassId) -> Option<SurfaceSize> {
        self.pass_sizes.get(&pass).copied()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_pass(&mut self, config: &PassConfig, size: SurfaceSize) -> PassId {
        let id = PassId(self.next_pass);
        self.next_pass += 1;
        self.pass_sizes.insert(id, size);
        log::trace!("Created {:?} pass {:?} at {}", config.kind, id, size);
        id
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn resize_pass(&mut self, pass: PassId, size: SurfaceSize) {
        self.pass_sizes.insert(pass, size);
    }

    fn render(&mut self, frame: &FramePlan) -> Result<(), RenderError> {
        for pass in &frame.passes {
            let buffer = self.pass_sizes.get(&pass.id).copied().unwrap_or_default();
            if buffer != self.size {
                return Err(RenderError::StaleSurfaceSize {
                    pass: pass.config.kind,
                    buffer,
                    surface: self.size,
                });
            }
            log::trace!("{:?} pass drew {} items", pass.config.kind, pass.draws.len());
        }
        self.frames.push(RecordedFrame {
            size: frame.size,
            tone_mapping: frame.tone_mapping,
            passes: frame
                .passes
                .iter()
                .map(|pass| RecordedPass {
                    kind: pass.config.kind,
                    config: pass.config,
                    draws: pass.draws.clone(),
                })
                .collect(),
        });
        Ok(())
    }
}
