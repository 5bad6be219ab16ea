use std::time::{Duration, Instant};

const DEFAULT_FRAME: Duration = Duration::from_millis(16);
const REPORT_INTERVAL_SECS: f32 = 0.5;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_report_time: Option<Instant>,
    frame_count: u32,
    pub frame_dt: f32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            last_report_time: None,
            frame_count: 0,
            frame_dt: DEFAULT_FRAME.as_secs_f32(),
        }
    }

    /// Records a frame at `now` and returns the seconds since the previous one.
    pub fn update(&mut self, now: Instant) -> f32 {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            DEFAULT_FRAME
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let report_start = *self.last_report_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(report_start).as_secs_f32();
        if elapsed >= REPORT_INTERVAL_SECS {
            let fps = self.frame_count as f32 / elapsed;
            log::debug!(
                "{:.1} fps (cadence {:.2} ms)",
                fps,
                self.frame_dt * 1000.0
            );
            self.frame_count = 0;
            self.last_report_time = Some(now);
        }
        self.frame_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_uses_default_cadence() {
        let mut timing = FrameTiming::new();
        let dt = timing.update(Instant::now());
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn delta_follows_clock() {
        let mut timing = FrameTiming::new();
        let start = Instant::now();
        timing.update(start);
        let dt = timing.update(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-6);

        let dt = timing.update(start);
        assert_eq!(dt, 0.0);
    }
}
