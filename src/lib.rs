//! Scroll- and panel-driven transform animation for a layered 3D render
//! pipeline.

pub mod anim;
pub mod app;
pub mod assets;
pub mod config;
pub mod render;
pub mod scene;
pub mod timeline;
pub mod ui;

pub use app::{Stage, StageError};
pub use config::StageConfig;
