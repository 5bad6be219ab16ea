pub mod backend;
pub mod camera;

pub use backend::{PassId, RecordedFrame, RecordedPass, RecordingBackend, RenderBackend};
pub use camera::PerspectiveCamera;

use crate::scene::variants::{DrawItem, Layer, LayerMask};
use glam::Mat4;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{pass:?} pass buffer is {buffer} but the surface is {surface}")]
    StaleSurfaceSize {
        pass: PassKind,
        buffer: SurfaceSize,
        surface: SurfaceSize,
    },
    #[error("render surface has zero area ({0})")]
    EmptySurface(SurfaceSize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Draws default-visibility nodes.
    Base,
    /// Bright-pass threshold, blur and additive composite of the emphasis layer.
    Bloom,
    /// Plain draw of extra layers composited over the frame.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 1.16,
            threshold: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMappingMode {
    #[default]
    None,
    Linear,
    Reinhard,
    Cineon,
    AcesFilmic,
    AgX,
    Neutral,
    Custom,
}

impl ToneMappingMode {
    pub const ALL: [ToneMappingMode; 8] = [
        Self::None,
        Self::Linear,
        Self::Reinhard,
        Self::Cineon,
        Self::AcesFilmic,
        Self::AgX,
        Self::Neutral,
        Self::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "NoToneMapping",
            Self::Linear => "LinearToneMapping",
            Self::Reinhard => "ReinhardToneMapping",
            Self::Cineon => "CineonToneMapping",
            Self::AcesFilmic => "ACESFilmicToneMapping",
            Self::AgX => "AgXToneMapping",
            Self::Neutral => "NeutralToneMapping",
            Self::Custom => "CustomToneMapping",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Global stage applied after compositing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToneMapping {
    pub mode: ToneMappingMode,
    pub exposure: f32,
}

impl Default for ToneMapping {
    fn default() -> Self {
        Self {
            mode: ToneMappingMode::None,
            exposure: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassConfig {
    pub kind: PassKind,
    pub layers: LayerMask,
    pub bloom: Option<BloomSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub id: PassId,
    pub config: PassConfig,
    pub draws: Vec<DrawItem>,
}

/// Everything the backend needs for one frame, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub size: SurfaceSize,
    pub view_projection: Mat4,
    pub tone_mapping: ToneMapping,
    pub passes: Vec<PassPlan>,
}

#[derive(Debug, Clone)]
struct PassSlot {
    id: PassId,
    config: PassConfig,
    enabled: bool,
    buffer: SurfaceSize,
}

/// Ordered render passes over one backend.
pub struct RenderPipeline<B: RenderBackend> {
    backend: B,
    size: SurfaceSize,
    passes: Vec<PassSlot>,
    tone_mapping: ToneMapping,
}

impl<B: RenderBackend> RenderPipeline<B> {
    /// Creates the pipeline with its base pass.
    pub fn new(mut backend: B, size: SurfaceSize) -> Self {
        backend.set_size(size);
        let mut pipeline = Self {
            backend,
            size,
            passes: Vec::new(),
            tone_mapping: ToneMapping::default(),
        };
        pipeline.add_pass(PassConfig {
            kind: PassKind::Base,
            layers: LayerMask::single(Layer::BASE),
            bloom: None,
        });
        pipeline
    }

    fn add_pass(&mut self, config: PassConfig) -> PassId {
        let id = self.backend.create_pass(&config, self.size);
        log::info!("Added {:?} pass drawing layers {:#04x}", config.kind, config.layers.bits());
        self.passes.push(PassSlot {
            id,
            config,
            enabled: true,
            buffer: self.size,
        });
        id
    }

    /// Appends a bloom pass over the emphasis layer. A second call only
    /// updates the settings.
    pub fn add_bloom_pass(&mut self, settings: BloomSettings, enabled: bool) {
        if self.bloom_slot_mut().is_none() {
            self.add_pass(PassConfig {
                kind: PassKind::Bloom,
                layers: LayerMask::single(Layer::EMPHASIS),
                bloom: Some(settings),
            });
        }
        if let Some(slot) = self.bloom_slot_mut() {
            slot.config.bloom = Some(settings);
            slot.enabled = enabled;
        }
    }

    pub fn add_overlay_pass(&mut self, layers: LayerMask) -> PassId {
        self.add_pass(PassConfig {
            kind: PassKind::Overlay,
            layers,
            bloom: None,
        })
    }

    fn bloom_slot_mut(&mut self) -> Option<&mut PassSlot> {
        self.passes
            .iter_mut()
            .find(|slot| slot.config.kind == PassKind::Bloom)
    }

    /// Returns false when no bloom pass is configured.
    pub fn set_bloom_enabled(&mut self, enabled: bool) -> bool {
        match self.bloom_slot_mut() {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_bloom(&mut self, settings: BloomSettings) -> bool {
        match self.bloom_slot_mut() {
            Some(slot) => {
                slot.config.bloom = Some(settings);
                true
            }
            None => false,
        }
    }

    pub fn bloom(&self) -> Option<BloomSettings> {
        self.passes
            .iter()
            .find(|slot| slot.config.kind == PassKind::Bloom)
            .and_then(|slot| slot.config.bloom)
    }

    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    pub fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        self.tone_mapping = tone_mapping;
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Resizes the output surface and every pass buffer in one step.
    pub fn resize(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        log::info!("Resizing render pipeline {} -> {}", self.size, size);
        self.size = size;
        self.backend.set_size(size);
        for slot in &mut self.passes {
            self.backend.resize_pass(slot.id, size);
            slot.buffer = size;
        }
    }

    pub fn enabled_passes(&self) -> Vec<PassKind> {
        self.passes
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.config.kind)
            .collect()
    }

    /// Runs every enabled pass in declared order, each seeing only the draws
    /// on its layers.
    pub fn render(&mut self, draws: &[DrawItem], view_projection: Mat4) -> Result<(), RenderError> {
        if self.size.is_empty() {
            return Err(RenderError::EmptySurface(self.size));
        }
        let mut passes = Vec::with_capacity(self.passes.len());
        for slot in self.passes.iter().filter(|slot| slot.enabled) {
            if slot.buffer != self.size {
                return Err(RenderError::StaleSurfaceSize {
                    pass: slot.config.kind,
                    buffer: slot.buffer,
                    surface: self.size,
                });
            }
            passes.push(PassPlan {
                id: slot.id,
                config: slot.config,
                draws: draws
                    .iter()
                    .filter(|draw| slot.config.layers.contains(draw.layer))
                    .cloned()
                    .collect(),
            });
        }
        let frame = FramePlan {
            size: self.size,
            view_projection,
            tone_mapping: self.tone_mapping,
            passes,
        };
        self.backend.render(&frame)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::variants::{
        emphasis_material, wireframe_material, MaterialDesc, Mesh, SceneNode, VariantSet,
    };
    use crate::scene::TransformState;

    fn cube_draws() -> Vec<DrawItem> {
        let mut set = VariantSet::new(SceneNode::mesh(
            "Cube",
            Mesh {
                geometry: "cube".to_string(),
                material: MaterialDesc::default(),
            },
        ));
        set.push("bloom", Layer::EMPHASIS, emphasis_material);
        set.push("lines", Layer::OUTLINE, wireframe_material);
        set.draw_list(&TransformState::default())
    }

    #[test]
    fn base_pass_sees_only_default_layer() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        pipeline.render(&cube_draws(), Mat4::IDENTITY).unwrap();

        let frame = pipeline.backend().last_frame().unwrap();
        assert_eq!(frame.passes.len(), 1);
        assert_eq!(frame.passes[0].kind, PassKind::Base);
        assert_eq!(frame.passes[0].draws.len(), 1);
        assert_eq!(frame.passes[0].draws[0].layer, Layer::BASE);
    }

    #[test]
    fn passes_run_in_declared_order() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        pipeline.add_bloom_pass(BloomSettings::default(), true);
        pipeline.add_overlay_pass(LayerMask::single(Layer::OUTLINE));
        pipeline.render(&cube_draws(), Mat4::IDENTITY).unwrap();

        let frame = pipeline.backend().last_frame().unwrap();
        let kinds: Vec<_> = frame.passes.iter().map(|pass| pass.kind).collect();
        assert_eq!(kinds, vec![PassKind::Base, PassKind::Bloom, PassKind::Overlay]);
        assert_eq!(frame.passes[1].draws[0].layer, Layer::EMPHASIS);
        assert!(frame.passes[2].draws[0].material.wireframe);
    }

    #[test]
    fn disabled_bloom_matches_a_pipeline_without_bloom() {
        let draws = cube_draws();
        let size = SurfaceSize::new(1280, 720);

        let mut plain = RenderPipeline::new(RecordingBackend::new(), size);
        plain.render(&draws, Mat4::IDENTITY).unwrap();

        let mut with_bloom = RenderPipeline::new(RecordingBackend::new(), size);
        with_bloom.add_bloom_pass(BloomSettings::default(), true);
        with_bloom.render(&draws, Mat4::IDENTITY).unwrap();
        assert!(with_bloom.set_bloom_enabled(false));
        with_bloom.render(&draws, Mat4::IDENTITY).unwrap();

        let enabled_frame = &with_bloom.backend().frames()[0];
        assert_eq!(enabled_frame.passes.len(), 2);
        assert_eq!(
            with_bloom.backend().last_frame(),
            plain.backend().last_frame()
        );
    }

    #[test]
    fn resize_updates_every_pass_buffer() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        pipeline.add_bloom_pass(BloomSettings::default(), true);
        let size = SurfaceSize::new(1920, 1080);
        pipeline.resize(size);

        assert_eq!(pipeline.backend().size(), size);
        assert_eq!(pipeline.backend().pass_size(PassId(0)), Some(size));
        assert_eq!(pipeline.backend().pass_size(PassId(1)), Some(size));
        pipeline.render(&cube_draws(), Mat4::IDENTITY).unwrap();
        assert_eq!(pipeline.backend().last_frame().unwrap().size, size);
    }

    #[test]
    fn stale_backend_buffer_is_rejected() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        pipeline.backend_mut().set_size(SurfaceSize::new(640, 480));
        let err = pipeline.render(&cube_draws(), Mat4::IDENTITY).unwrap_err();
        assert!(matches!(err, RenderError::StaleSurfaceSize { .. }));
    }

    #[test]
    fn empty_surface_is_not_rendered() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        pipeline.resize(SurfaceSize::new(0, 600));
        assert!(matches!(
            pipeline.render(&cube_draws(), Mat4::IDENTITY),
            Err(RenderError::EmptySurface(_))
        ));
        assert!(pipeline.backend().frames().is_empty());
    }

    #[test]
    fn bloom_and_tone_settings_reach_the_frame() {
        let mut pipeline = RenderPipeline::new(RecordingBackend::new(), SurfaceSize::new(800, 600));
        assert!(!pipeline.set_bloom_enabled(true));
        pipeline.add_bloom_pass(BloomSettings::default(), true);
        let tuned = BloomSettings {
            strength: 3.0,
            ..BloomSettings::default()
        };
        assert!(pipeline.set_bloom(tuned));
        pipeline.set_tone_mapping(ToneMapping {
            mode: ToneMappingMode::AcesFilmic,
            exposure: 1.4,
        });
        pipeline.render(&cube_draws(), Mat4::IDENTITY).unwrap();

        let frame = pipeline.backend().last_frame().unwrap();
        assert_eq!(frame.passes[1].config.bloom, Some(tuned));
        assert_eq!(frame.tone_mapping.mode, ToneMappingMode::AcesFilmic);
        assert_eq!(pipeline.bloom(), Some(tuned));
    }

    #[test]
    fn tone_mode_indices_round_trip() {
        for mode in ToneMappingMode::ALL {
            assert_eq!(ToneMappingMode::from_index(mode.index()), Some(mode));
        }
        assert_eq!(ToneMappingMode::from_index(42), None);
    }
}
