use super::ease::Ease;
use crate::scene::{FieldPath, TransformState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

/// One write performed by the engine; the stage forwards these to the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenUpdate {
    pub path: FieldPath,
    pub value: f32,
    pub finished: bool,
}

/// Slack, in seconds per second of duration, under which a tween counts as
/// finished. Frame deltas summed over a tween's lifetime fall short of the
/// duration by rounding alone.
const FINISH_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Tween {
    id: TweenId,
    path: FieldPath,
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f64,
    ease: Ease,
}

impl Tween {
    fn sample(&self) -> (f32, bool) {
        let duration = f64::from(self.duration);
        if duration <= 0.0 || self.elapsed >= duration - FINISH_TOLERANCE * duration.max(1.0) {
            return (self.to, true);
        }
        let eased = self.ease.apply((self.elapsed / duration) as f32);
        (self.from + (self.to - self.from) * eased, false)
    }
}

/// Sole writer of [`TransformState`].
///
/// Timed tweens are sampled once per frame from [`TweenEngine::tick`]; scrubbed
/// writes land immediately. At most one timed tween exists per field path.
#[derive(Debug, Default)]
pub struct TweenEngine {
    active: Vec<Tween>,
    next_id: u64,
}

impl TweenEngine {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            next_id: 0,
        }
    }

    /// Starts a timed tween from the current value, superseding any tween
    /// already in flight on `path`.
    pub fn start(
        &mut self,
        state: &TransformState,
        path: FieldPath,
        target: f32,
        duration: f32,
        ease: Ease,
    ) -> TweenId {
        if self.cancel(path) {
            log::debug!("Superseding in-flight tween on {}", path);
        }
        let id = TweenId(self.next_id);
        self.next_id += 1;
        let from = state.component(path);
        log::debug!(
            "Tween {} on {}: {:.3} -> {:.3} over {:.2}s ({})",
            id.0,
            path,
            from,
            target,
            duration,
            ease
        );
        self.active.push(Tween {
            id,
            path,
            from,
            to: target,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ease,
        });
        id
    }

    pub fn cancel(&mut self, path: FieldPath) -> bool {
        let before = self.active.len();
        self.active.retain(|tween| tween.path != path);
        self.active.len() != before
    }

    pub fn is_animating(&self, path: FieldPath) -> bool {
        self.active.iter().any(|tween| tween.path == path)
    }

    pub fn is_running(&self, id: TweenId) -> bool {
        self.active.iter().any(|tween| tween.id == id)
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    /// Advances every timed tween by `dt` seconds and writes one sample each.
    /// The returned updates include the final sample of tweens that finished.
    pub fn tick(&mut self, state: &mut TransformState, dt: f32) -> Vec<TweenUpdate> {
        let dt = dt.max(0.0);
        let mut updates = Vec::with_capacity(self.active.len());
        for tween in &mut self.active {
            tween.elapsed += f64::from(dt);
            let (value, finished) = tween.sample();
            state.apply_component(tween.path, value);
            log::trace!("Tween {} wrote {} = {:.4}", tween.id.0, tween.path, value);
            updates.push(TweenUpdate {
                path: tween.path,
                value,
                finished,
            });
        }
        self.active.retain(|tween| !tween.sample().1);
        updates
    }

    /// Direct write with no duration, used for scroll scrubbing.
    pub fn scrub(&mut self, state: &mut TransformState, path: FieldPath, value: f32) -> TweenUpdate {
        state.apply_component(path, value);
        TweenUpdate {
            path,
            value,
            finished: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Axis, TransformField};

    const ROT_X: FieldPath = FieldPath::new(TransformField::Rotation, Axis::X);
    const ROT_Y: FieldPath = FieldPath::new(TransformField::Rotation, Axis::Y);

    #[test]
    fn timed_tween_lands_exactly_on_target() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        engine.start(&state, ROT_X, 1.25, 1.0, Ease::EXPO_OUT);

        let mut samples = Vec::new();
        for _ in 0..70 {
            samples.extend(engine.tick(&mut state, 1.0 / 60.0));
        }

        assert_eq!(state.component(ROT_X), 1.25);
        assert!(!engine.is_animating(ROT_X));
        let last = samples.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.value, 1.25);
        assert_eq!(samples.iter().filter(|update| update.finished).count(), 1);
    }

    #[test]
    fn sixty_frames_finish_a_one_second_tween() {
        for ease in [Ease::LINEAR, Ease::EXPO_OUT] {
            let mut state = TransformState::default();
            let mut engine = TweenEngine::new();
            engine.start(&state, ROT_X, 1.0, 1.0, ease);

            let mut last = None;
            for _ in 0..60 {
                last = engine.tick(&mut state, 1.0 / 60.0).pop();
            }

            assert_eq!(state.component(ROT_X), 1.0, "{}", ease);
            assert!(!engine.is_animating(ROT_X), "{}", ease);
            assert!(last.unwrap().finished, "{}", ease);
        }
    }

    #[test]
    fn two_second_tween_finishes_on_its_last_frame() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        engine.start(&state, ROT_Y, -3.0, 2.0, Ease::EXPO_OUT);

        for _ in 0..119 {
            engine.tick(&mut state, 1.0 / 60.0);
        }
        assert!(engine.is_animating(ROT_Y));
        engine.tick(&mut state, 1.0 / 60.0);
        assert_eq!(state.component(ROT_Y), -3.0);
        assert!(!engine.is_animating(ROT_Y));
    }

    #[test]
    fn every_sample_reports_an_update() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        engine.start(&state, ROT_Y, 2.0, 1.0, Ease::LINEAR);

        let mut count = 0;
        while engine.in_flight() > 0 {
            count += engine.tick(&mut state, 0.25).len();
        }
        assert_eq!(count, 4);
        assert_eq!(state.component(ROT_Y), 2.0);
    }

    #[test]
    fn new_tween_supersedes_in_flight_one() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        let a = engine.start(&state, ROT_Y, 10.0, 1.0, Ease::LINEAR);
        engine.tick(&mut state, 0.5);
        let midway = state.component(ROT_Y);
        assert!((midway - 5.0).abs() < 1e-5);

        let b = engine.start(&state, ROT_Y, -1.0, 0.5, Ease::LINEAR);
        assert!(!engine.is_running(a));
        assert!(engine.is_running(b));
        assert_eq!(engine.in_flight(), 1);

        let update = engine.tick(&mut state, 0.25);
        assert_eq!(update.len(), 1);
        let expected = midway + (-1.0 - midway) * 0.5;
        assert!((state.component(ROT_Y) - expected).abs() < 1e-5);

        for _ in 0..10 {
            engine.tick(&mut state, 0.25);
        }
        assert_eq!(state.component(ROT_Y), -1.0);
    }

    #[test]
    fn tweens_on_other_paths_run_side_by_side() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        engine.start(&state, ROT_X, 1.0, 1.0, Ease::LINEAR);
        engine.start(&state, ROT_Y, 2.0, 1.0, Ease::LINEAR);
        assert_eq!(engine.in_flight(), 2);

        engine.tick(&mut state, 1.0);
        assert_eq!(state.component(ROT_X), 1.0);
        assert_eq!(state.component(ROT_Y), 2.0);
    }

    #[test]
    fn zero_duration_completes_on_next_tick() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        engine.start(&state, ROT_X, 0.5, 0.0, Ease::EXPO_OUT);
        let updates = engine.tick(&mut state, 0.0);
        assert_eq!(updates.len(), 1);
        assert!(updates[0].finished);
        assert_eq!(state.component(ROT_X), 0.5);
        assert_eq!(engine.in_flight(), 0);
    }

    #[test]
    fn scrub_writes_immediately() {
        let mut state = TransformState::default();
        let mut engine = TweenEngine::new();
        let update = engine.scrub(&mut state, ROT_Y, 3.15);
        assert_eq!(state.component(ROT_Y), 3.15);
        assert_eq!(update.value, 3.15);
        assert_eq!(engine.in_flight(), 0);
    }
}
