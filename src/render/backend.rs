use crate::display::{DisplayServer, PictureId, TextureId};
use crate::foundation::core::Rect;
use crate::foundation::error::{WincompError, WincompResult};
use crate::foundation::math::Fixed;
use crate::region::Region;
use crate::render::binding::SurfaceBinding;
use crate::session::opts::CompositorOpts;

/// Rendering strategy, chosen once per session.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Composite into an offscreen target picture, then copy it to the screen.
    #[default]
    XRender,
    /// Draw window textures into an accelerated framebuffer.
    Glx,
    /// Compose like [`BackendKind::XRender`], present through the accelerated path.
    Hybrid,
}

impl BackendKind {
    /// Lowercase name, as accepted by the CLI and options.
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::XRender => "xrender",
            BackendKind::Glx => "glx",
            BackendKind::Hybrid => "hybrid",
        }
    }
}

/// What one paint reads from: a picture, a texture, or a temporary inverted copy.
#[derive(Debug, Default)]
pub struct PaintSource {
    /// Source picture (target-composited backends).
    pub picture: Option<PictureId>,
    /// Source texture (texture-accelerated backends).
    pub texture: Option<TextureId>,
    /// Invert colors while drawing.
    pub invert: bool,
    /// Temporary surface owned by this paint, released by `end_paint`.
    pub scratch: Option<SurfaceBinding>,
}

impl PaintSource {
    /// Read straight from a binding.
    pub fn of(binding: &SurfaceBinding, invert: bool) -> Self {
        Self {
            picture: binding.picture(),
            texture: binding.texture(),
            invert,
            scratch: None,
        }
    }
}

/// One source-to-screen copy, already clipped to `region` by the caller.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    /// Column inside the source surface where the copy starts.
    pub src_x: i32,
    /// Row inside the source surface where the copy starts.
    pub src_y: i32,
    /// Screen column receiving `src_x`.
    pub dst_x: i32,
    /// Screen row receiving `src_y`.
    pub dst_y: i32,
    /// Size of the copied piece; frame pieces are often a thin strip.
    pub width: i32,
    /// See `width`.
    pub height: i32,
    /// Opacity in `[0, 1]`; quantized to an alpha step on picture backends.
    pub opacity: f64,
    /// Whether the source alpha must be honored.
    pub argb: bool,
    /// Screen region being painted.
    pub region: &'a Region,
}

/// One background blur behind a window.
#[derive(Clone, Copy, Debug)]
pub struct BlurRequest<'a> {
    /// Window rectangle on screen.
    pub area: Rect,
    /// Normalized fixed-point kernels, one per pass.
    pub kernels: &'a [Vec<Fixed>],
    /// Area to blur, in window-local coordinates.
    pub clip: &'a Region,
    /// Screen region being painted.
    pub region: &'a Region,
}

/// Composite operations the compositor issues, implemented once per backend.
pub trait RenderBackend {
    /// Which variant this is.
    fn kind(&self) -> BackendKind;

    /// Whether surfaces are painted through pictures (otherwise through textures).
    fn uses_pictures(&self) -> bool;

    /// Whether an accelerated context exists that must be waited on and flushed.
    fn has_gl_context(&self) -> bool {
        false
    }

    /// Create session resources.
    fn init(&mut self, server: &mut dyn DisplayServer, opts: &CompositorOpts)
    -> WincompResult<()>;

    /// Release session resources. Safe to call more than once.
    fn deinit(&mut self, server: &mut dyn DisplayServer);

    /// Whether `binding` holds what this backend paints from.
    fn is_valid(&self, binding: &SurfaceBinding) -> bool {
        binding.is_valid(self.uses_pictures())
    }

    /// Bind `binding` as a texture when this backend draws textures; always `true` otherwise.
    fn bind_texture(
        &mut self,
        server: &mut dyn DisplayServer,
        binding: &mut SurfaceBinding,
        width: i32,
        height: i32,
        depth: u8,
        force: bool,
    ) -> bool {
        let _ = (server, binding, width, height, depth, force);
        true
    }

    /// Prepare a frame drawn into `target` for the given (screen-clipped) damage.
    fn frame_start(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &SurfaceBinding,
        damage: &Region,
    ) -> WincompResult<()>;

    /// Restrict subsequent paints to `region`.
    fn set_clip(&mut self, server: &mut dyn DisplayServer, region: &Region);

    /// Source for painting `binding`, inverted when asked.
    fn begin_paint(
        &mut self,
        server: &mut dyn DisplayServer,
        binding: &SurfaceBinding,
        width: i32,
        height: i32,
        has_alpha: bool,
        invert: bool,
    ) -> PaintSource {
        let _ = (server, width, height, has_alpha);
        PaintSource::of(binding, invert)
    }

    /// Release whatever `begin_paint` created.
    fn end_paint(&mut self, server: &mut dyn DisplayServer, source: PaintSource) {
        if let Some(mut scratch) = source.scratch {
            scratch.free(server);
        }
    }

    /// Paint `source` at `opacity`.
    fn render(
        &mut self,
        server: &mut dyn DisplayServer,
        source: &PaintSource,
        req: &RenderRequest<'_>,
    );

    /// Darken `rect` by blending black at `opacity`.
    fn dim(&mut self, server: &mut dyn DisplayServer, rect: Rect, opacity: f64, region: &Region);

    /// Blur what is already painted behind a window. `false` when the blur was skipped.
    fn blur(&mut self, server: &mut dyn DisplayServer, req: &BlurRequest<'_>) -> bool;

    /// Put the composed frame on screen.
    fn present(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &mut SurfaceBinding,
        damage: &Region,
        use_glfinish: bool,
        no_rebind: bool,
    );
}

/// Instantiate the backend for `kind`; `Unsupported` when it is not compiled in.
pub fn create_backend(kind: BackendKind) -> WincompResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::XRender => Ok(Box::new(crate::render::xrender::XRenderBackend::new())),
        #[cfg(feature = "accel")]
        BackendKind::Glx => Ok(Box::new(crate::render::glx::GlxBackend::new())),
        #[cfg(feature = "accel")]
        BackendKind::Hybrid => Ok(Box::new(crate::render::hybrid::HybridBackend::new())),
        #[allow(unreachable_patterns)]
        _ => Err(WincompError::unsupported(format!(
            "backend '{}' is not available in this build",
            kind.name()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
