//! Damage-driven compositing core of an X-style compositing manager.
//!
//! A [`Compositor`] takes a bottom-to-top window stack and a damage region, paints the root
//! background, shadows, background blur, window bodies and dimming into a frame target through
//! one [`RenderBackend`], and presents the frame with optional vblank pacing. Every request goes
//! through the [`DisplayServer`] trait; [`MemoryServer`] implements it in software.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

pub mod display;
pub mod effects;
pub mod region;
pub mod render;
pub mod scene;
pub mod session;

pub use display::memory::{MemoryServer, ServerCall};
pub use display::{DisplayServer, PictFormat, PictOp, PictureId, PixmapId, TextureId, WindowId};
pub use foundation::core::{Color, Margins, Rect, Rgba8Premul};
pub use foundation::error::{WincompError, WincompResult};
pub use foundation::math::{Fixed, double_to_fixed, fixed_to_double};
pub use region::Region;
pub use render::backend::{BackendKind, RenderBackend, create_backend};
pub use render::binding::SurfaceBinding;
pub use scene::{Scene, WindowSpec};
pub use session::compositor::{Compositor, FrameStats};
pub use session::opts::{
    BackgroundOpts, BlurOpts, CompositorOpts, DimOpts, ShadowOpts, VsyncMode,
};
pub use session::window::{FadeObserver, NoFade, Window, WindowMode, update_reg_ignore};
