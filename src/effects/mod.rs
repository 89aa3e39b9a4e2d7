//! Shadow and background-blur effects.

pub mod blur;
pub mod kernel;
pub mod shadow;
