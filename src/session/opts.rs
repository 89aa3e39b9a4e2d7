use crate::effects::blur::{BlurKernel, parse_kernel_list};
use crate::effects::kernel::MAX_SHADOW_RADIUS;
use crate::foundation::core::{Color, Rect};
use crate::foundation::error::{WincompError, WincompResult};
use crate::render::backend::BackendKind;

/// Vertical-blank pacing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VsyncMode {
    /// Present as soon as the frame is composed.
    #[default]
    Off,
    /// Wait for vblank, then send the present.
    Conservative,
    /// Send the present, then wait for vblank.
    Aggressive,
}

/// Options consumed by the compositing core.
///
/// Every field has a default, so a partial JSON object deserializes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorOpts {
    /// Rendering backend.
    pub backend: BackendKind,
    /// Vblank pacing.
    pub vsync: VsyncMode,
    /// Use `glFinish` rather than a flush when waiting for accelerated rendering.
    pub vsync_use_glfinish: bool,
    /// Sync with the X fence before each frame.
    pub sync_fence: bool,
    /// Do not rebind window textures when their pixmap is damaged.
    pub glx_no_rebind_pixmap: bool,
    /// Treat every window as having an alpha channel.
    pub force_win_blend: bool,
    /// Number of opacity steps (the alpha table has `max_alpha + 1` entries).
    pub max_alpha: u8,
    /// Drop shadows.
    pub shadow: ShadowOpts,
    /// Background blur.
    pub blur: BlurOpts,
    /// Inactive window dimming.
    pub dim: DimOpts,
    /// Root background.
    pub background: BackgroundOpts,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            vsync: VsyncMode::Off,
            vsync_use_glfinish: false,
            sync_fence: false,
            glx_no_rebind_pixmap: false,
            force_win_blend: false,
            max_alpha: 255,
            shadow: ShadowOpts::default(),
            blur: BlurOpts::default(),
            dim: DimOpts::default(),
            background: BackgroundOpts::default(),
        }
    }
}

/// Shadow options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowOpts {
    /// Paint shadows for windows that ask for one.
    pub enabled: bool,
    /// Red channel of the shadow color.
    pub red: f64,
    /// Green channel of the shadow color.
    pub green: f64,
    /// Blue channel of the shadow color.
    pub blue: f64,
    /// Gaussian radius in pixels.
    pub radius: u32,
    /// Horizontal offset.
    pub offset_x: i32,
    /// Vertical offset.
    pub offset_y: i32,
    /// Base shadow opacity.
    pub opacity: f64,
    /// Screen areas never covered by shadows.
    pub exclude: Vec<Rect>,
}

impl Default for ShadowOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            red: 0.0,
            green: 0.0,
            blue: 0.0,
            radius: 12,
            offset_x: -15,
            offset_y: -15,
            opacity: 0.75,
            exclude: Vec::new(),
        }
    }
}

impl ShadowOpts {
    /// Shadow color; black unless a channel is set.
    pub fn color(&self) -> Color {
        Color::rgba(self.red, self.green, self.blue, 1.0)
    }
}

/// Background blur options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurOpts {
    /// Blur behind semi-transparent windows.
    pub background: bool,
    /// Also blur behind opaque windows whose frame is translucent.
    pub frame: bool,
    /// Do not scale blur strength with window opacity.
    pub fixed: bool,
    /// A preset name or `;`-separated kernels in `w,h,values` form.
    pub kernel: String,
}

impl Default for BlurOpts {
    fn default() -> Self {
        Self {
            background: false,
            frame: false,
            fixed: false,
            kernel: "3x3box".to_owned(),
        }
    }
}

impl BlurOpts {
    /// Parsed source kernels.
    pub fn kernels(&self) -> WincompResult<Vec<BlurKernel>> {
        parse_kernel_list(&self.kernel)
    }
}

/// Dimming options.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DimOpts {
    /// Dim strength for windows flagged `dim`.
    pub inactive: f64,
    /// Do not scale the dim with window opacity.
    pub fixed: bool,
}

/// Root background options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackgroundOpts {
    /// Look for a background pixmap published on the root window.
    pub probe_root: bool,
    /// Fill used when no background pixmap is found.
    pub fallback: Color,
}

impl Default for BackgroundOpts {
    fn default() -> Self {
        Self {
            probe_root: true,
            fallback: Color::from_u16(0x8080, 0x8080, 0x8080, 0xffff),
        }
    }
}

impl CompositorOpts {
    /// Reject values the core cannot work with.
    pub fn validate(&self) -> WincompResult<()> {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        if !unit(self.shadow.opacity) {
            return Err(WincompError::validation("shadow opacity must be within 0..=1"));
        }
        if ![self.shadow.red, self.shadow.green, self.shadow.blue]
            .into_iter()
            .all(unit)
        {
            return Err(WincompError::validation("shadow color channels must be within 0..=1"));
        }
        if !unit(self.dim.inactive) {
            return Err(WincompError::validation("inactive dim must be within 0..=1"));
        }
        if self.shadow.radius > MAX_SHADOW_RADIUS {
            return Err(WincompError::validation(format!(
                "shadow radius must be at most {MAX_SHADOW_RADIUS}"
            )));
        }
        if self.max_alpha == 0 {
            return Err(WincompError::validation("max_alpha must be > 0"));
        }
        if self.blur.background {
            self.blur.kernels()?;
        }
        Ok(())
    }

    /// Parse options from JSON.
    pub fn from_json(src: &str) -> WincompResult<Self> {
        let opts: Self =
            serde_json::from_str(src).map_err(|e| WincompError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
