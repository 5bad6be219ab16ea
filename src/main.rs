//! Headless replay of the authored page against the recording backend.
//!
//! Usage: `scrollstage [config.json]`

use scrollstage::app::{FrameTiming, HostEvent, ScrollInput};
use scrollstage::assets::{demo_cube, load_node_graph};
use scrollstage::config::load_config;
use scrollstage::render::{RecordingBackend, SurfaceSize};
use scrollstage::scene::{Axis, FieldPath, TransformField};
use scrollstage::timeline::layout::PageLayout;
use scrollstage::ui::{egui_panel, ControlTarget};
use scrollstage::{Stage, StageConfig, StageError};

use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

/// Page length used when the config carries no layout.
const DEFAULT_MAX_SCROLL: f32 = 3000.0;
const SCROLL_STEPS: usize = 24;
const FRAME: Duration = Duration::from_micros(16_667);

struct Replay {
    stage: Stage<RecordingBackend>,
    input: ScrollInput,
    timing: FrameTiming,
    clock: Instant,
    egui: egui::Context,
}

impl Replay {
    fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Scrolled { progress } => self.stage.on_scroll(progress),
            HostEvent::Resized(size) => {
                self.stage.on_resize(size);
                if let Some(layout) = self.stage.timeline().layout() {
                    self.input.set_max_scroll(layout.max_scroll());
                }
            }
        }
    }

    fn frame(&mut self) -> Result<(), StageError> {
        self.clock += FRAME;
        let dt = self.timing.update(self.clock);
        let size = self.stage.viewport();
        let raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(size.width as f32, size.height as f32),
            )),
            ..Default::default()
        };
        let panel = self.stage.panel_mut();
        let _ = self
            .egui
            .run(raw_input, |ctx| egui_panel::show_panel(ctx, panel));
        self.stage.frame(dt)?;
        Ok(())
    }

    fn scroll(&mut self, delta_px: f32) -> Result<(), StageError> {
        if let Some(progress) = self.input.scroll_by(delta_px) {
            self.dispatch(HostEvent::Scrolled { progress });
            log_transform(&self.stage, progress);
        }
        self.frame()
    }

    fn settle(&mut self, seconds: f32) -> Result<(), StageError> {
        let frames = (seconds / FRAME.as_secs_f32()).ceil() as usize;
        for _ in 0..frames {
            self.frame()?;
        }
        Ok(())
    }
}

fn log_transform(stage: &Stage<RecordingBackend>, progress: f32) {
    let transform = stage.transform();
    log::info!(
        "progress {:.3}: rotation {:.3} scale {:.3} position {:.3}",
        progress,
        transform.get(TransformField::Rotation),
        transform.get(TransformField::Scale),
        transform.get(TransformField::Position)
    );
}

fn run(config: StageConfig) -> Result<(), StageError> {
    let viewport = SurfaceSize::new(1280, 720);
    let mut stage = Stage::new(&config, RecordingBackend::new(), viewport)?;
    let model = match &config.model_path {
        Some(path) => load_node_graph(path),
        None => Ok(demo_cube()),
    };
    stage.on_model_loaded(model);

    let max_scroll = config
        .layout
        .as_ref()
        .map_or(DEFAULT_MAX_SCROLL, PageLayout::max_scroll);
    let mut replay = Replay {
        stage,
        input: ScrollInput::new(max_scroll),
        timing: FrameTiming::new(),
        clock: Instant::now(),
        egui: egui::Context::default(),
    };

    let step = max_scroll / SCROLL_STEPS as f32;
    log::info!("Scrolling down");
    for _ in 0..SCROLL_STEPS {
        replay.scroll(step)?;
    }
    log::info!("Scrolling back up");
    for _ in 0..SCROLL_STEPS {
        replay.scroll(-step)?;
    }

    let wide = WindowEvent::Resized(PhysicalSize::new(2560, 1440));
    if let Some(event) = replay.input.handle_event(&wide) {
        replay.dispatch(event);
    }
    replay.settle(0.6)?;
    log_transform(&replay.stage, replay.input.progress());

    let rotation_x = FieldPath::new(TransformField::Rotation, Axis::X);
    if let Some(id) = replay
        .stage
        .panel_sync()
        .control_for(ControlTarget::Transform(rotation_x))
    {
        log::info!("Panel edit: {} -> 1.0", rotation_x);
        replay.stage.panel_mut().edit(id, 1.0);
    }
    replay.settle(1.1)?;
    log_transform(&replay.stage, replay.input.progress());

    log::info!(
        "Rendered {} frames at {}",
        replay.stage.pipeline().backend().frames().len(),
        replay.stage.viewport()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config {}", path);
                config
            }
            Err(err) => {
                log::error!("Failed to load config {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => StageConfig::default(),
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Replay failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
