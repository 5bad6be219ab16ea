//! Eased interpolation of transform fields.

pub mod ease;
pub mod tween;

pub use ease::Ease;
pub use tween::{TweenEngine, TweenId, TweenUpdate};
