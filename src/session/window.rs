use crate::display::{PictFormat, WindowId};
use crate::effects::shadow::ShadowGeometry;
use crate::foundation::core::{Margins, Rect};
use crate::region::Region;
use crate::render::binding::SurfaceBinding;
use crate::session::opts::ShadowOpts;

/// How much of a window covers what lies below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Fully opaque.
    Solid,
    /// Opaque body, translucent frame.
    FrameTrans,
    /// Translucent or carrying its own alpha.
    Trans,
}

/// Render state of one onscreen window.
///
/// Attributes are resolved by the caller; the bindings are owned and managed by the compositor.
#[derive(Clone, Debug)]
pub struct Window {
    /// Window id, used to name its pixmap.
    pub id: WindowId,
    /// Screen position.
    pub x: i32,
    /// Screen position.
    pub y: i32,
    /// Border-inclusive width.
    pub width: i32,
    /// Border-inclusive height.
    pub height: i32,
    /// Handles used to paint the window body.
    pub paint: SurfaceBinding,
    /// Handles of the cached shadow surface.
    pub shadow_paint: SurfaceBinding,
    /// Frame extents drawn by the window manager.
    pub frame: Margins,
    /// Body opacity.
    pub opacity: f64,
    /// Frame opacity, multiplied with `opacity`.
    pub frame_opacity: f64,
    /// The window's pixels carry an alpha channel.
    pub has_alpha: bool,
    /// Paint with inverted colors.
    pub invert_color: bool,
    /// Blur what lies behind the window.
    pub blur_background: bool,
    /// Overlay the inactive dim.
    pub dim: bool,
    /// Cast a shadow.
    pub shadow: bool,
    /// Paint the shadow under the window body too.
    pub full_shadow: bool,
    /// Shadow placement.
    pub shadow_geometry: ShadowGeometry,
    /// Shadow opacity, already multiplied with the window's opacities.
    pub shadow_opacity: f64,
    /// Screen region obscured by solid windows above this one.
    pub reg_ignore: Region,
    /// Window shape in window-local coordinates.
    pub bounding_shape: Region,
    /// Contents changed since the texture was last bound.
    pub pixmap_damaged: bool,
}

impl Window {
    /// An opaque rectangular window with no effects.
    pub fn new(id: WindowId, rect: Rect) -> Self {
        Self {
            id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            paint: SurfaceBinding::new(),
            shadow_paint: SurfaceBinding::new(),
            frame: Margins::default(),
            opacity: 1.0,
            frame_opacity: 1.0,
            has_alpha: false,
            invert_color: false,
            blur_background: false,
            dim: false,
            shadow: false,
            full_shadow: false,
            shadow_geometry: ShadowGeometry::default(),
            shadow_opacity: 0.0,
            reg_ignore: Region::new(),
            bounding_shape: Region::from_rect(Rect::new(0, 0, rect.width, rect.height)),
            pixmap_damaged: false,
        }
    }

    /// Screen rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Frame extents with negative values clamped to zero.
    pub fn frame_extents(&self) -> Margins {
        Margins::new(
            self.frame.top.max(0),
            self.frame.left.max(0),
            self.frame.bottom.max(0),
            self.frame.right.max(0),
        )
    }

    /// Whether a frame is drawn around the window.
    pub fn has_frame(&self) -> bool {
        !self.frame_extents().is_zero()
    }

    /// Classify how the window covers what lies below.
    pub fn mode(&self) -> WindowMode {
        if self.has_alpha || self.opacity < 1.0 {
            WindowMode::Trans
        } else if self.frame_opacity != 1.0 && self.has_frame() {
            WindowMode::FrameTrans
        } else {
            WindowMode::Solid
        }
    }

    /// Whether the window hides everything below it.
    pub fn is_solid(&self, force_win_blend: bool) -> bool {
        self.mode() == WindowMode::Solid && !force_win_blend
    }

    /// Pixel format of the window's pixmap.
    pub fn pict_format(&self) -> PictFormat {
        if self.has_alpha {
            PictFormat::Argb32
        } else {
            PictFormat::Rgb24
        }
    }

    /// Bounding shape in screen coordinates.
    pub fn bounding_shape_global(&self) -> Region {
        self.bounding_shape.clone().translated(self.x, self.y)
    }

    /// Window-local rectangle inside the frame; empty when the frame covers everything.
    pub fn region_noframe_local(&self) -> Region {
        let m = self.frame_extents();
        let width = self.width - m.left - m.right;
        let height = self.height - m.top - m.bottom;
        if width <= 0 || height <= 0 {
            return Region::new();
        }
        Region::from_rect(Rect::new(m.left, m.top, width, height))
    }

    /// Screen region that hides what lies below when the window is solid.
    pub fn opaque_region(&self) -> Region {
        if self.frame_opacity == 1.0 {
            return self.bounding_shape_global();
        }
        self.region_noframe_local()
            .and(&self.bounding_shape)
            .translated(self.x, self.y)
    }

    /// Recompute shadow geometry and opacity from the options.
    pub fn update_shadow(&mut self, opts: &ShadowOpts) {
        self.shadow_geometry = ShadowGeometry::for_window(
            self.width,
            self.height,
            opts.radius,
            opts.offset_x,
            opts.offset_y,
        );
        self.shadow_opacity = opts.opacity * self.opacity * self.frame_opacity;
    }
}

/// Recompute `reg_ignore` for a bottom-to-top stack.
///
/// Each window ignores the union of the opaque regions of the solid windows above it.
pub fn update_reg_ignore(windows: &mut [Window], force_win_blend: bool) {
    let mut above = Region::new();
    for w in windows.iter_mut().rev() {
        w.reg_ignore = above.clone();
        if w.is_solid(force_win_blend) {
            above.union(&w.opaque_region());
        }
    }
}

/// Receives every window after its frame is presented.
pub trait FadeObserver {
    /// Called once per window, bottom to top.
    fn fade_check(&mut self, window: &mut Window);
}

/// Observer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFade;

impl FadeObserver for NoFade {
    fn fade_check(&mut self, _window: &mut Window) {}
}

impl<F: FnMut(&mut Window)> FadeObserver for F {
    fn fade_check(&mut self, window: &mut Window) {
        self(window)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/window.rs"]
mod tests;
