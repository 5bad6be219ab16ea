//! The stage: one object, its scroll timeline, its panel and its pipeline.
//!
//! All handlers run to completion on the caller's thread. Scroll and panel
//! input mutate the transform only through the tween engine; `frame` is the
//! per-refresh task that samples tweens, mirrors them to the panel and renders.

pub mod input;
mod timing;

pub use input::{HostEvent, ScrollInput};
pub use timing::FrameTiming;

use crate::anim::{TweenEngine, TweenUpdate};
use crate::assets::AssetError;
use crate::config::{StageConfig, VariantToggles};
use crate::render::{
    PerspectiveCamera, RenderBackend, RenderError, RenderPipeline, SurfaceSize, ToneMappingMode,
};
use crate::scene::variants::{
    emphasis_material, wireframe_material, Layer, LayerMask, SceneNode, VariantSet,
};
use crate::scene::{Axis, FieldPath, TransformField, TransformState};
use crate::timeline::media::MediaRules;
use crate::timeline::{ScrollTimeline, ScrollUpdate, TimedTrigger, TimelineError};
use crate::ui::{
    default_controls, BloomParam, ControlPanel, ControlTarget, PanelError, PanelSync, UserEdit,
};

use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct Stage<B: RenderBackend> {
    transform: TransformState,
    variants: Option<VariantSet>,
    variant_toggles: VariantToggles,
    camera: PerspectiveCamera,
    pipeline: RenderPipeline<B>,
    timeline: ScrollTimeline,
    tweens: TweenEngine,
    panel: ControlPanel,
    sync: PanelSync,
    /// Paths whose in-flight tween came from a panel edit. Their in-between
    /// samples are not mirrored back onto the edited control.
    panel_driven: HashSet<FieldPath>,
    media: MediaRules,
    viewport: SurfaceSize,
    scroll_progress: f32,
}

impl<B: RenderBackend> Stage<B> {
    /// Builds the stage from authored defaults. The object itself arrives
    /// later through [`Stage::on_model_loaded`].
    pub fn new(config: &StageConfig, backend: B, viewport: SurfaceSize) -> Result<Self, StageError> {
        let initial = &config.initial_transform;
        let transform = TransformState::new(
            initial.get(TransformField::Rotation),
            initial.get(TransformField::Scale),
            initial.get(TransformField::Position),
        );

        let mut camera = config.camera;
        camera.set_aspect(viewport);

        let mut pipeline = RenderPipeline::new(backend, viewport);
        pipeline.add_bloom_pass(config.bloom.settings, config.bloom.enabled);
        if config.variants.wireframe {
            pipeline.add_overlay_pass(LayerMask::single(Layer::OUTLINE));
        }
        pipeline.set_tone_mapping(config.tone_mapping);

        let mut timeline = ScrollTimeline::new(transform, config.layout.clone());
        for zone in &config.zones {
            timeline.register(zone.clone())?;
        }

        let mut panel = ControlPanel::new();
        let mut sync = PanelSync::new(config.panel);
        for spec in default_controls() {
            sync.bind_control(&mut panel, spec)?;
        }

        let mut stage = Self {
            transform,
            variants: None,
            variant_toggles: config.variants,
            camera,
            pipeline,
            timeline,
            tweens: TweenEngine::new(),
            panel,
            sync,
            panel_driven: HashSet::new(),
            media: MediaRules::new(config.media_rules.clone()),
            viewport,
            scroll_progress: 0.0,
        };
        stage.refresh_all_displays();
        stage.evaluate_media_rules();
        log::info!(
            "Stage ready: {} zones, viewport {}",
            stage.timeline.len(),
            viewport
        );
        Ok(stage)
    }

    /// Builds the render variants, or renders without the object when the
    /// load failed.
    pub fn on_model_loaded(&mut self, result: Result<SceneNode, AssetError>) {
        match result {
            Ok(root) => {
                let mut set = VariantSet::new(root);
                if self.variant_toggles.emphasis {
                    set.push("emphasis", Layer::EMPHASIS, emphasis_material);
                }
                if self.variant_toggles.wireframe {
                    set.push("wireframe", Layer::OUTLINE, wireframe_material);
                }
                log::info!(
                    "Model ready with {} render variants",
                    set.variants().len()
                );
                self.variants = Some(set);
            }
            Err(err) => {
                log::warn!("Model failed to load, rendering an empty scene: {}", err);
                self.variants = None;
            }
        }
    }

    /// Scrubs every zone-driven field to its value at `progress`.
    pub fn on_scroll(&mut self, progress: f32) {
        self.scroll_progress = progress;
        let update = self.timeline.update(progress);
        self.apply_scroll_update(update);
    }

    fn apply_scroll_update(&mut self, update: ScrollUpdate) {
        for write in update.writes {
            let written = self
                .tweens
                .scrub(&mut self.transform, write.path, write.value);
            self.mirror(written);
        }
        for trigger in update.triggers {
            self.start_trigger(trigger);
        }
    }

    fn start_trigger(&mut self, trigger: TimedTrigger) {
        log::debug!("`{}` triggered a tween on {}", trigger.source, trigger.path);
        self.panel_driven.remove(&trigger.path);
        self.tweens.start(
            &self.transform,
            trigger.path,
            trigger.target,
            trigger.duration,
            trigger.ease,
        );
    }

    fn mirror(&mut self, update: TweenUpdate) {
        self.sync.refresh_display(
            &mut self.panel,
            ControlTarget::Transform(update.path),
            update.value,
        );
    }

    /// Camera aspect, pipeline buffers, zone ranges and media rules, in
    /// that order, before any further frame is rendered.
    pub fn on_resize(&mut self, size: SurfaceSize) {
        self.viewport = size;
        self.camera.set_aspect(size);
        self.pipeline.resize(size);

        let relaid = self
            .timeline
            .layout()
            .map(|layout| layout.with_viewport_height(size.height as f32));
        if let Some(layout) = relaid {
            match self.timeline.relayout(layout) {
                Ok(()) => {
                    // Entry tweens that already played are not replayed.
                    let mut update = self.timeline.update(self.scroll_progress);
                    update.triggers.clear();
                    self.apply_scroll_update(update);
                }
                Err(err) => log::warn!("Keeping previous zone ranges after resize: {}", err),
            }
        }

        self.evaluate_media_rules();
        for axis in Axis::ALL {
            let value = self.camera.position_axis(axis);
            self.sync
                .refresh_display(&mut self.panel, ControlTarget::Camera(axis), value);
        }
    }

    fn evaluate_media_rules(&mut self) {
        for trigger in self.media.evaluate(self.viewport.width, &self.transform) {
            self.start_trigger(trigger);
        }
    }

    /// Applies queued user edits. Transform edits become timed tweens; the
    /// other controls set their value directly.
    pub fn handle_panel_edits(&mut self) -> usize {
        let edits = self.sync.take_user_edits(&mut self.panel);
        let count = edits.len();
        for edit in edits {
            self.apply_edit(edit);
        }
        count
    }

    fn apply_edit(&mut self, edit: UserEdit) {
        let UserEdit { target, value } = edit;
        match target {
            ControlTarget::Transform(path) => {
                let policy = self.sync.policy();
                self.tweens
                    .start(&self.transform, path, value, policy.duration, policy.ease);
                self.panel_driven.insert(path);
            }
            ControlTarget::Camera(axis) => self.camera.set_position_axis(axis, value),
            ControlTarget::Bloom(param) => {
                let mut settings = self.pipeline.bloom().unwrap_or_default();
                match param {
                    BloomParam::Strength => settings.strength = value,
                    BloomParam::Radius => settings.radius = value,
                    BloomParam::Threshold => settings.threshold = value,
                }
                self.pipeline.set_bloom(settings);
            }
            ControlTarget::Exposure => {
                let mut tone = self.pipeline.tone_mapping();
                tone.exposure = value;
                self.pipeline.set_tone_mapping(tone);
            }
            ControlTarget::ToneMode => {
                match ToneMappingMode::from_index(value.round().max(0.0) as usize) {
                    Some(mode) => {
                        let mut tone = self.pipeline.tone_mapping();
                        tone.mode = mode;
                        self.pipeline.set_tone_mapping(tone);
                    }
                    None => log::warn!("Ignoring unknown tone mapping index {}", value),
                }
            }
        }
    }

    /// One display refresh: panel edits, tween samples, panel mirror, render.
    pub fn frame(&mut self, dt: f32) -> Result<(), RenderError> {
        self.handle_panel_edits();
        for update in self.tweens.tick(&mut self.transform, dt) {
            if self.panel_driven.contains(&update.path) {
                if !update.finished {
                    continue;
                }
                self.panel_driven.remove(&update.path);
            }
            self.mirror(update);
        }
        if self.viewport.is_empty() {
            log::trace!("Skipping frame for empty viewport {}", self.viewport);
            return Ok(());
        }
        let draws = self
            .variants
            .as_ref()
            .map(|set| set.draw_list(&self.transform))
            .unwrap_or_default();
        self.pipeline.render(&draws, self.camera.view_projection())
    }

    fn refresh_all_displays(&mut self) {
        let mut values = Vec::new();
        for field in TransformField::ALL {
            for axis in Axis::ALL {
                let path = FieldPath::new(field, axis);
                values.push((ControlTarget::Transform(path), self.transform.component(path)));
            }
        }
        for axis in Axis::ALL {
            values.push((ControlTarget::Camera(axis), self.camera.position_axis(axis)));
        }
        if let Some(bloom) = self.pipeline.bloom() {
            values.push((ControlTarget::Bloom(BloomParam::Strength), bloom.strength));
            values.push((ControlTarget::Bloom(BloomParam::Radius), bloom.radius));
            values.push((ControlTarget::Bloom(BloomParam::Threshold), bloom.threshold));
        }
        let tone = self.pipeline.tone_mapping();
        values.push((ControlTarget::Exposure, tone.exposure));
        values.push((ControlTarget::ToneMode, tone.mode.index() as f32));

        for (target, value) in values {
            self.sync.refresh_display(&mut self.panel, target, value);
        }
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn pipeline(&self) -> &RenderPipeline<B> {
        &self.pipeline
    }

    pub fn timeline(&self) -> &ScrollTimeline {
        &self.timeline
    }

    pub fn tweens(&self) -> &TweenEngine {
        &self.tweens
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ControlPanel {
        &mut self.panel
    }

    pub fn panel_sync(&self) -> &PanelSync {
        &self.sync
    }

    pub fn variants(&self) -> Option<&VariantSet> {
        self.variants.as_ref()
    }

    pub fn viewport(&self) -> SurfaceSize {
        self.viewport
    }
}
