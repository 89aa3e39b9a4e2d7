//! JSON scene description: a screen, an optional desktop background and a window stack.
//!
//! A scene populates a [`MemoryServer`], resolves the window stack (shadow geometry and
//! `reg_ignore`) and renders one frame.

use std::collections::HashSet;

use crate::display::WindowId;
use crate::display::memory::MemoryServer;
use crate::foundation::core::{Color, Margins, Rect};
use crate::foundation::error::{WincompError, WincompResult};
use crate::region::Region;
use crate::session::compositor::{Compositor, FrameStats};
use crate::session::opts::CompositorOpts;
use crate::session::window::{NoFade, Window, update_reg_ignore};

/// One screen's worth of windows.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Screen width.
    pub width: u16,
    /// Screen height.
    pub height: u16,
    /// Solid desktop background published on the root window; the fallback fill when absent.
    #[serde(default)]
    pub background: Option<Color>,
    /// Compositor options.
    #[serde(default)]
    pub opts: CompositorOpts,
    /// Damaged screen area; the whole screen when absent.
    #[serde(default)]
    pub damage: Option<Vec<Rect>>,
    /// Bottom to top.
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
}

/// One window of a [`Scene`]; flags mean the same as on [`Window`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WindowSpec {
    /// Unique within the scene; names the window's pixmap on the server.
    pub id: WindowId,
    /// Screen rectangle.
    pub rect: Rect,
    /// Fill of the window contents (straight alpha).
    pub color: Color,
    /// Body opacity.
    #[serde(default = "one")]
    pub opacity: f64,
    /// Frame opacity.
    #[serde(default = "one")]
    pub frame_opacity: f64,
    /// Frame extents.
    #[serde(default)]
    pub frame: Margins,
    /// Contents carry alpha (depth 32).
    #[serde(default)]
    pub has_alpha: bool,
    /// Paint inverted.
    #[serde(default)]
    pub invert_color: bool,
    /// Blur whatever shows through the window.
    #[serde(default)]
    pub blur_background: bool,
    /// Dim as inactive.
    #[serde(default)]
    pub dim: bool,
    /// Cast a shadow.
    #[serde(default)]
    pub shadow: bool,
    /// Shadow also under the body.
    #[serde(default)]
    pub full_shadow: bool,
    /// Window-local shape rectangles; the full window when absent.
    #[serde(default)]
    pub shape: Option<Vec<Rect>>,
}

fn one() -> f64 {
    1.0
}

impl Scene {
    /// Parse and validate a scene.
    pub fn from_json(src: &str) -> WincompResult<Self> {
        let scene: Self =
            serde_json::from_str(src).map_err(|e| WincompError::serde(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Reject scenes that cannot be rendered.
    pub fn validate(&self) -> WincompResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WincompError::validation("scene width/height must be > 0"));
        }
        self.opts.validate()?;

        let mut ids = HashSet::new();
        for w in &self.windows {
            if !ids.insert(w.id) {
                return Err(WincompError::validation(format!(
                    "window {:?} appears twice",
                    w.id
                )));
            }
            if w.rect.is_empty() {
                return Err(WincompError::validation(format!(
                    "window {:?} has an empty rectangle",
                    w.id
                )));
            }
            for (name, v) in [("opacity", w.opacity), ("frame_opacity", w.frame_opacity)] {
                if !(0.0..=1.0).contains(&v) {
                    return Err(WincompError::validation(format!(
                        "window {:?} {name} must be within 0..=1",
                        w.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// A server holding the screen, the background and every window's contents.
    pub fn build_server(&self) -> WincompResult<MemoryServer> {
        let mut server = MemoryServer::new(self.width, self.height);
        if let Some(color) = self.background {
            let px = color.to_premul_rgba8().to_array();
            let count = usize::from(self.width) * usize::from(self.height);
            server.set_root_background(
                i32::from(self.width),
                i32::from(self.height),
                &px.repeat(count),
            )?;
        }
        for w in &self.windows {
            let depth = if w.has_alpha { 32 } else { 24 };
            server.fill_window(
                w.id,
                w.rect.width,
                w.rect.height,
                depth,
                w.color.to_premul_rgba8(),
            )?;
        }
        Ok(server)
    }

    /// Resolved window stack, bottom to top.
    pub fn build_windows(&self, compositor: &Compositor) -> Vec<Window> {
        let mut windows: Vec<Window> = self
            .windows
            .iter()
            .map(|spec| {
                let mut w = Window::new(spec.id, spec.rect);
                w.opacity = spec.opacity;
                w.frame_opacity = spec.frame_opacity;
                w.frame = spec.frame;
                w.has_alpha = spec.has_alpha;
                w.invert_color = spec.invert_color;
                w.blur_background = spec.blur_background;
                w.dim = spec.dim;
                w.shadow = spec.shadow;
                w.full_shadow = spec.full_shadow;
                if let Some(shape) = &spec.shape {
                    w.bounding_shape = Region::from_rects(shape.iter().copied())
                        .and(&Region::from_rect(Rect::new(0, 0, spec.rect.width, spec.rect.height)));
                }
                compositor.prepare_window(&mut w);
                w
            })
            .collect();
        update_reg_ignore(&mut windows, compositor.opts().force_win_blend);
        windows
    }

    /// Damage as a region.
    pub fn damage_region(&self) -> Option<Region> {
        self.damage
            .as_ref()
            .map(|rects| Region::from_rects(rects.iter().copied()))
    }

    /// Render one frame; returns the screen as RGBA8 plus the frame statistics.
    #[tracing::instrument(skip(self), fields(windows = self.windows.len()))]
    pub fn render(&self) -> WincompResult<(Vec<u8>, FrameStats)> {
        let mut server = self.build_server()?;
        let mut compositor = Compositor::new(&mut server, self.opts.clone())?;
        let mut windows = self.build_windows(&compositor);
        let damage = self.damage_region();
        let result = compositor.paint_all(&mut server, &mut windows, damage.as_ref(), &mut NoFade);
        for w in &mut windows {
            compositor.free_window(&mut server, w);
        }
        compositor.deinit(&mut server);
        let stats = result?;
        Ok((server.screen_rgba(), stats))
    }
}

#[cfg(test)]
#[path = "../tests/unit/scene.rs"]
mod tests;
