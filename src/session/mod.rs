//! Frame composition: options, window state, per-window painting and presentation.

pub mod compositor;
pub mod opts;
pub mod paint;
pub mod present;
pub mod window;
