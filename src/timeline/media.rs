use super::TimedTrigger;
use crate::anim::Ease;
use crate::scene::{AxisValues, FieldPath, TransformField, TransformState};

fn default_duration() -> f32 {
    0.5
}

fn default_ease() -> Ease {
    Ease::POWER1_OUT
}

/// Viewport-width condition that tweens a field while it holds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaRule {
    pub name: String,
    pub min_width: u32,
    pub field: TransformField,
    pub targets: AxisValues,
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(default = "default_ease")]
    pub ease: Ease,
}

#[derive(Debug, Clone)]
struct RuleSlot {
    rule: MediaRule,
    /// Values captured on entry, restored on exit.
    saved: Option<Vec<(FieldPath, f32)>>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaRules {
    slots: Vec<RuleSlot>,
}

impl MediaRules {
    pub fn new(rules: Vec<MediaRule>) -> Self {
        Self {
            slots: rules
                .into_iter()
                .map(|rule| RuleSlot { rule, saved: None })
                .collect(),
        }
    }

    pub fn is_matched(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.rule.name == name && slot.saved.is_some())
    }

    /// Tweens for rules whose match state changed at `width`. Entering a rule
    /// tweens toward its targets; leaving it tweens back to the values it found.
    pub fn evaluate(&mut self, width: u32, state: &TransformState) -> Vec<TimedTrigger> {
        let mut triggers = Vec::new();
        for slot in &mut self.slots {
            let matches = width >= slot.rule.min_width;
            match (matches, slot.saved.take()) {
                (true, None) => {
                    log::debug!("Media rule `{}` matched at width {}", slot.rule.name, width);
                    let mut saved = Vec::new();
                    for (axis, target) in slot.rule.targets.iter() {
                        let path = FieldPath::new(slot.rule.field, axis);
                        saved.push((path, state.component(path)));
                        triggers.push(TimedTrigger {
                            source: slot.rule.name.clone(),
                            path,
                            target,
                            duration: slot.rule.duration,
                            ease: slot.rule.ease,
                        });
                    }
                    slot.saved = Some(saved);
                }
                (false, Some(saved)) => {
                    log::debug!("Media rule `{}` released at width {}", slot.rule.name, width);
                    for (path, value) in saved {
                        triggers.push(TimedTrigger {
                            source: slot.rule.name.clone(),
                            path,
                            target: value,
                            duration: slot.rule.duration,
                            ease: slot.rule.ease,
                        });
                    }
                }
                (_, saved) => slot.saved = saved,
            }
        }
        triggers
    }
}
