//! Scroll-progress zones driving transform fields.
//!
//! The timeline is a pure function of scroll progress: every update folds the
//! registered zones in evaluation order on top of the authored defaults, so
//! reversing the scroll reverses the effect with no residual state. Evaluation
//! order is ascending `(priority, registration index)`; the later zone wins.

pub mod layout;
pub mod media;

use crate::anim::Ease;
use crate::scene::{Axis, AxisValues, FieldPath, TransformField, TransformState};
use layout::{Anchor, PageLayout};

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("zone `{zone}` has start {start:.3} >= end {end:.3} and can never become active")]
    BindingRange { zone: String, start: f32, end: f32 },
    #[error("zone `{zone}` range [{start:.3}, {end:.3}] lies outside [0, 1]")]
    ProgressOutOfRange { zone: String, start: f32, end: f32 },
    #[error("zone `{0}` has no target axes")]
    EmptyTargets(String),
    #[error("zone `{0}` uses anchors but no page layout is configured")]
    MissingLayout(String),
    #[error("unknown page region `{0}`")]
    UnknownRegion(String),
    #[error("invalid anchor `{0}`")]
    InvalidAnchor(String),
    #[error("page is not scrollable (page height {page_height}, viewport {viewport_height})")]
    NotScrollable {
        page_height: f32,
        viewport_height: f32,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRange {
    /// Explicit scroll-progress fractions.
    Progress { start: f32, end: f32 },
    /// Anchors on a named page region, resolved through the page layout.
    Anchored {
        trigger: String,
        start: Anchor,
        end: Anchor,
    },
}

fn default_scrub() -> bool {
    true
}

fn default_trigger_duration() -> f32 {
    0.5
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoneBinding {
    pub name: String,
    pub range: ZoneRange,
    pub field: TransformField,
    pub targets: AxisValues,
    /// Start values; missing axes chain from the previous zone's target.
    #[serde(default)]
    pub from: AxisValues,
    #[serde(default)]
    pub ease: Ease,
    #[serde(default = "default_scrub")]
    pub scrub: bool,
    #[serde(default)]
    pub priority: i32,
    /// Tween length for zones with `scrub: false`.
    #[serde(default = "default_trigger_duration")]
    pub duration: f32,
}

impl ZoneBinding {
    pub fn progress(
        name: impl Into<String>,
        start: f32,
        end: f32,
        field: TransformField,
        targets: AxisValues,
    ) -> Self {
        Self {
            name: name.into(),
            range: ZoneRange::Progress { start, end },
            field,
            targets,
            from: AxisValues::default(),
            ease: Ease::LINEAR,
            scrub: true,
            priority: 0,
            duration: default_trigger_duration(),
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_from(mut self, from: AxisValues) -> Self {
        self.from = from;
        self
    }

    /// Plays a timed tween once on forward entry instead of scrubbing.
    pub fn triggered(mut self, duration: f32) -> Self {
        self.scrub = false;
        self.duration = duration;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Before,
    Active,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollWrite {
    pub path: FieldPath,
    pub value: f32,
}

/// Timed tween requested by a non-scrubbed zone or a media rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedTrigger {
    pub source: String,
    pub path: FieldPath,
    pub target: f32,
    pub duration: f32,
    pub ease: Ease,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollUpdate {
    /// At most one write per field path.
    pub writes: Vec<ScrollWrite>,
    pub triggers: Vec<TimedTrigger>,
}

#[derive(Debug, Clone)]
struct RegisteredZone {
    binding: ZoneBinding,
    start: f32,
    end: f32,
    /// Resolved start value for every target axis.
    from: AxisValues,
}

impl RegisteredZone {
    fn state(&self, progress: f32) -> ZoneState {
        if progress < self.start {
            ZoneState::Before
        } else if progress > self.end {
            ZoneState::After
        } else {
            ZoneState::Active
        }
    }

    fn local_progress(&self, progress: f32) -> f32 {
        ((progress - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }

    fn value(&self, axis: Axis, progress: f32) -> Option<f32> {
        let to = self.binding.targets.get(axis)?;
        let from = self.from.get(axis)?;
        Some(from + (to - from) * self.binding.ease.apply(self.local_progress(progress)))
    }

    fn drives(&self, path: FieldPath) -> bool {
        self.binding.scrub
            && self.binding.field == path.field
            && self.binding.targets.get(path.axis).is_some()
    }
}

/// Zone bindings owned by one stage.
#[derive(Debug, Clone)]
pub struct ScrollTimeline {
    base: TransformState,
    layout: Option<PageLayout>,
    zones: Vec<RegisteredZone>,
    eval_order: Vec<usize>,
    last_states: Option<Vec<ZoneState>>,
}

impl ScrollTimeline {
    /// `base` holds the authored defaults that zones fold on top of.
    pub fn new(base: TransformState, layout: Option<PageLayout>) -> Self {
        Self {
            base,
            layout,
            zones: Vec::new(),
            eval_order: Vec::new(),
            last_states: None,
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn layout(&self) -> Option<&PageLayout> {
        self.layout.as_ref()
    }

    /// Validates and appends a zone. Zones that could never become active are
    /// rejected here rather than silently ignored at scroll time.
    pub fn register(&mut self, binding: ZoneBinding) -> Result<usize, TimelineError> {
        if binding.targets.iter().next().is_none() {
            return Err(TimelineError::EmptyTargets(binding.name));
        }
        let (start, end) = resolve_range(&binding, self.layout.as_ref())?;

        let mut from = AxisValues::default();
        for (axis, _) in binding.targets.iter() {
            let path = FieldPath::new(binding.field, axis);
            let value = binding
                .from
                .get(axis)
                .or_else(|| self.previous_target(path))
                .unwrap_or_else(|| self.base.component(path));
            from.set(axis, Some(value));
        }

        log::debug!(
            "Registered zone `{}` on {} over [{:.3}, {:.3}]",
            binding.name,
            binding.field.name(),
            start,
            end
        );
        let index = self.zones.len();
        self.zones.push(RegisteredZone {
            binding,
            start,
            end,
            from,
        });
        self.rebuild_order();
        self.last_states = None;
        Ok(index)
    }

    fn previous_target(&self, path: FieldPath) -> Option<f32> {
        self.zones
            .iter()
            .rev()
            .filter(|zone| zone.binding.field == path.field)
            .find_map(|zone| zone.binding.targets.get(path.axis))
    }

    fn rebuild_order(&mut self) {
        let mut order: Vec<usize> = (0..self.zones.len()).collect();
        order.sort_by_key(|&index| (self.zones[index].binding.priority, index));
        self.eval_order = order;
    }

    /// Re-resolves every anchored zone against `layout`. Either all zones are
    /// updated or none are.
    pub fn relayout(&mut self, layout: PageLayout) -> Result<(), TimelineError> {
        let mut ranges = Vec::with_capacity(self.zones.len());
        for zone in &self.zones {
            ranges.push(resolve_range(&zone.binding, Some(&layout))?);
        }
        for (zone, (start, end)) in self.zones.iter_mut().zip(ranges) {
            zone.start = start;
            zone.end = end;
        }
        self.layout = Some(layout);
        self.last_states = None;
        Ok(())
    }

    pub fn zone_range(&self, name: &str) -> Option<(f32, f32)> {
        self.zones
            .iter()
            .find(|zone| zone.binding.name == name)
            .map(|zone| (zone.start, zone.end))
    }

    /// State computed by the most recent update.
    pub fn zone_state(&self, name: &str) -> Option<ZoneState> {
        let index = self.zones.iter().position(|zone| zone.binding.name == name)?;
        self.last_states.as_ref().map(|states| states[index])
    }

    /// Field value at `progress` for one scalar path, ignoring whether the
    /// path would be written this update.
    pub fn value_at(&self, path: FieldPath, progress: f32) -> f32 {
        let progress = sanitize(progress);
        let mut value = self.base.component(path);
        for &index in &self.eval_order {
            let zone = &self.zones[index];
            if !zone.drives(path) || zone.state(progress) == ZoneState::Before {
                continue;
            }
            if let Some(sample) = zone.value(path.axis, progress) {
                value = sample;
            }
        }
        value
    }

    /// Computes the writes for the current scroll progress.
    ///
    /// A path is written when one of its zones is active, when any of its
    /// zones changed state since the last update, or on the first update.
    pub fn update(&mut self, progress: f32) -> ScrollUpdate {
        let progress = sanitize(progress);
        let states: Vec<ZoneState> = self.zones.iter().map(|zone| zone.state(progress)).collect();
        let previous = self.last_states.take();

        if let Some(previous) = &previous {
            for ((zone, before), now) in self.zones.iter().zip(previous).zip(&states) {
                if before != now {
                    log::debug!("Zone `{}`: {:?} -> {:?}", zone.binding.name, before, now);
                }
            }
        }

        let mut update = ScrollUpdate::default();
        for path in self.driven_paths() {
            let dirty = self.zones.iter().enumerate().any(|(index, zone)| {
                zone.drives(path)
                    && (states[index] == ZoneState::Active
                        || previous
                            .as_ref()
                            .map_or(true, |previous| previous[index] != states[index]))
            });
            if dirty {
                update.writes.push(ScrollWrite {
                    path,
                    value: self.value_at(path, progress),
                });
            }
        }

        for (index, zone) in self.zones.iter().enumerate() {
            if zone.binding.scrub {
                continue;
            }
            let before = previous
                .as_ref()
                .map_or(ZoneState::Before, |previous| previous[index]);
            if before == ZoneState::Before && states[index] != ZoneState::Before {
                for (axis, target) in zone.binding.targets.iter() {
                    update.triggers.push(TimedTrigger {
                        source: zone.binding.name.clone(),
                        path: FieldPath::new(zone.binding.field, axis),
                        target,
                        duration: zone.binding.duration,
                        ease: zone.binding.ease,
                    });
                }
            }
        }

        self.last_states = Some(states);
        update
    }

    /// Scrubbed paths in first-registration order.
    fn driven_paths(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = Vec::new();
        for zone in self.zones.iter().filter(|zone| zone.binding.scrub) {
            for (axis, _) in zone.binding.targets.iter() {
                let path = FieldPath::new(zone.binding.field, axis);
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        paths
    }
}

fn sanitize(progress: f32) -> f32 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn resolve_range(
    binding: &ZoneBinding,
    layout: Option<&PageLayout>,
) -> Result<(f32, f32), TimelineError> {
    let (start, end) = match &binding.range {
        ZoneRange::Progress { start, end } => {
            if !(0.0..=1.0).contains(start) || !(0.0..=1.0).contains(end) {
                return Err(TimelineError::ProgressOutOfRange {
                    zone: binding.name.clone(),
                    start: *start,
                    end: *end,
                });
            }
            (*start, *end)
        }
        ZoneRange::Anchored {
            trigger,
            start,
            end,
        } => {
            let layout = layout.ok_or_else(|| TimelineError::MissingLayout(binding.name.clone()))?;
            (layout.resolve(trigger, *start)?, layout.resolve(trigger, *end)?)
        }
    };
    if start >= end {
        return Err(TimelineError::BindingRange {
            zone: binding.name.clone(),
            start,
            end,
        });
    }
    Ok((start, end))
}
