//! Control panel model and its two-way binding to the stage.
//!
//! Widgets report user edits as queued [`PanelEdit`] events and receive
//! programmatic values through `refresh_display`. [`PanelSync`] owns the
//! control-to-target bindings and guarantees a display refresh is never seen
//! as a user edit.

pub mod egui_panel;

use crate::anim::Ease;
use crate::render::ToneMappingMode;
use crate::scene::{Axis, FieldPath, TransformField};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BloomParam {
    Strength,
    Radius,
    Threshold,
}

/// What a control edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    Transform(FieldPath),
    Camera(Axis),
    Bloom(BloomParam),
    Exposure,
    ToneMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    pub folder: String,
    pub label: String,
    pub target: ControlTarget,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    /// Non-empty for choice controls; the value is the option index.
    pub options: Vec<String>,
}

impl ControlSpec {
    pub fn slider(
        folder: &str,
        label: &str,
        target: ControlTarget,
        min: f32,
        max: f32,
        step: f32,
    ) -> Self {
        Self {
            folder: folder.to_string(),
            label: label.to_string(),
            target,
            min,
            max,
            step,
            options: Vec::new(),
        }
    }

    pub fn choice(folder: &str, label: &str, target: ControlTarget, options: Vec<String>) -> Self {
        let max = options.len().saturating_sub(1) as f32;
        Self {
            folder: folder.to_string(),
            label: label.to_string(),
            target,
            min: 0.0,
            max,
            step: 1.0,
            options,
        }
    }

    pub fn is_choice(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelEdit {
    pub control: ControlId,
    pub value: f32,
}

/// Edit carrying the target it was bound to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserEdit {
    pub target: ControlTarget,
    pub value: f32,
}

pub trait PanelWidget {
    fn add_control(&mut self, spec: ControlSpec) -> ControlId;
    /// Updates the shown value. Must not be reported back as an edit.
    fn refresh_display(&mut self, control: ControlId, value: f32);
    fn take_edits(&mut self) -> Vec<PanelEdit>;
}

#[derive(Debug, Clone)]
pub struct PanelControl {
    pub id: ControlId,
    pub spec: ControlSpec,
    display: f32,
    refreshes: u64,
}

impl PanelControl {
    pub fn display(&self) -> f32 {
        self.display
    }
}

/// In-process panel model; `egui_panel::show_panel` draws it.
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    controls: Vec<PanelControl>,
    pending: Vec<PanelEdit>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controls(&self) -> &[PanelControl] {
        &self.controls
    }

    pub fn control(&self, id: ControlId) -> Option<&PanelControl> {
        self.controls.get(id.0)
    }

    pub fn display(&self, id: ControlId) -> Option<f32> {
        self.control(id).map(PanelControl::display)
    }

    pub fn refresh_count(&self, id: ControlId) -> u64 {
        self.control(id).map_or(0, |control| control.refreshes)
    }

    /// Folder names in first-use order.
    pub fn folders(&self) -> Vec<&str> {
        let mut folders: Vec<&str> = Vec::new();
        for control in &self.controls {
            if !folders.contains(&control.spec.folder.as_str()) {
                folders.push(&control.spec.folder);
            }
        }
        folders
    }

    /// User-originated change, as from dragging a slider.
    pub fn edit(&mut self, id: ControlId, value: f32) -> bool {
        let Some(control) = self.controls.get_mut(id.0) else {
            return false;
        };
        let value = control.spec.clamp(value);
        control.display = value;
        self.pending.push(PanelEdit { control: id, value });
        true
    }
}

impl PanelWidget for ControlPanel {
    fn add_control(&mut self, spec: ControlSpec) -> ControlId {
        let id = ControlId(self.controls.len());
        let display = spec.min.max(0.0).min(spec.max);
        self.controls.push(PanelControl {
            id,
            spec,
            display,
            refreshes: 0,
        });
        id
    }

    fn refresh_display(&mut self, control: ControlId, value: f32) {
        if let Some(control) = self.controls.get_mut(control.0) {
            control.display = control.spec.clamp(value);
            control.refreshes += 1;
        }
    }

    fn take_edits(&mut self) -> Vec<PanelEdit> {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("{0:?} is already bound to a control")]
    AlreadyBound(ControlTarget),
    #[error("control `{label}` has min {min} >= max {max}")]
    InvalidRange { label: String, min: f32, max: f32 },
}

fn default_edit_duration() -> f32 {
    1.0
}

fn default_edit_ease() -> Ease {
    Ease::EXPO_OUT
}

/// Tween applied to transform edits coming from the panel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditPolicy {
    #[serde(default = "default_edit_duration")]
    pub duration: f32,
    #[serde(default = "default_edit_ease")]
    pub ease: Ease,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            duration: default_edit_duration(),
            ease: default_edit_ease(),
        }
    }
}

/// One binding per target; one display subscriber per control.
#[derive(Debug, Default)]
pub struct PanelSync {
    policy: EditPolicy,
    by_target: HashMap<ControlTarget, ControlId>,
    by_control: HashMap<ControlId, ControlTarget>,
    queued: Vec<UserEdit>,
}

impl PanelSync {
    pub fn new(policy: EditPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub fn control_for(&self, target: ControlTarget) -> Option<ControlId> {
        self.by_target.get(&target).copied()
    }

    pub fn bind_control<W: PanelWidget>(
        &mut self,
        widget: &mut W,
        spec: ControlSpec,
    ) -> Result<ControlId, PanelError> {
        if spec.min.is_nan() || spec.max.is_nan() || spec.min >= spec.max {
            return Err(PanelError::InvalidRange {
                label: spec.label,
                min: spec.min,
                max: spec.max,
            });
        }
        if self.by_target.contains_key(&spec.target) {
            return Err(PanelError::AlreadyBound(spec.target));
        }
        let target = spec.target;
        let id = widget.add_control(spec);
        self.by_target.insert(target, id);
        self.by_control.insert(id, target);
        Ok(id)
    }

    /// Mirrors a programmatic value into the control bound to `target`.
    ///
    /// Edits the widget reports while refreshing are echoes and are dropped;
    /// edits queued before the refresh are kept for [`take_user_edits`].
    ///
    /// [`take_user_edits`]: PanelSync::take_user_edits
    pub fn refresh_display<W: PanelWidget>(
        &mut self,
        widget: &mut W,
        target: ControlTarget,
        value: f32,
    ) -> bool {
        let Some(id) = self.control_for(target) else {
            return false;
        };
        let earlier = widget.take_edits();
        self.queue(earlier);
        widget.refresh_display(id, value);
        for echo in widget.take_edits() {
            log::trace!("Dropped echo edit {:?} = {:.4}", echo.control, echo.value);
        }
        true
    }

    fn queue(&mut self, edits: Vec<PanelEdit>) {
        for edit in edits {
            match self.by_control.get(&edit.control) {
                Some(&target) => self.queued.push(UserEdit {
                    target,
                    value: edit.value,
                }),
                None => log::trace!("Ignoring edit from unbound control {:?}", edit.control),
            }
        }
    }

    pub fn take_user_edits<W: PanelWidget>(&mut self, widget: &mut W) -> Vec<UserEdit> {
        let edits = widget.take_edits();
        self.queue(edits);
        std::mem::take(&mut self.queued)
    }
}

const TRANSFORM_FOLDERS: [(TransformField, &str, f32, f32, f32); 3] = [
    (TransformField::Rotation, "Rotation", -359.0, 359.0, 0.1),
    (TransformField::Scale, "Scale", 0.0, 2.5, 0.01),
    (TransformField::Position, "Position", -1000.0, 1000.0, 1.0),
];

/// The authored panel layout, folder by folder.
pub fn default_controls() -> Vec<ControlSpec> {
    let mut controls = vec![
        ControlSpec::slider(
            "Bloom",
            "strength",
            ControlTarget::Bloom(BloomParam::Strength),
            0.0,
            10.0,
            0.1,
        ),
        ControlSpec::slider(
            "Bloom",
            "radius",
            ControlTarget::Bloom(BloomParam::Radius),
            0.0,
            10.0,
            0.01,
        ),
        ControlSpec::slider(
            "Bloom",
            "threshold",
            ControlTarget::Bloom(BloomParam::Threshold),
            0.0,
            1.0,
            0.01,
        ),
        ControlSpec::choice(
            "Tone Mapping",
            "toneMapping",
            ControlTarget::ToneMode,
            ToneMappingMode::ALL
                .iter()
                .map(|mode| mode.label().to_string())
                .collect(),
        ),
        ControlSpec::slider("Tone Mapping", "exposure", ControlTarget::Exposure, 0.1, 2.0, 0.01),
    ];
    for axis in Axis::ALL {
        let range = if axis == Axis::Z { 1000.0 } else { 500.0 };
        controls.push(ControlSpec::slider(
            "Camera",
            axis.name(),
            ControlTarget::Camera(axis),
            -range,
            range,
            1.0,
        ));
    }
    for (field, folder, min, max, step) in TRANSFORM_FOLDERS {
        for axis in Axis::ALL {
            controls.push(ControlSpec::slider(
                folder,
                axis.name(),
                ControlTarget::Transform(FieldPath::new(field, axis)),
                min,
                max,
                step,
            ));
        }
    }
    controls
}
