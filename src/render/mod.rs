//! Rendering resources and the backend abstraction.

pub mod alpha;
pub mod backend;
pub mod binding;
#[cfg(feature = "accel")]
pub mod glx;
#[cfg(feature = "accel")]
pub mod hybrid;
pub mod xrender;
