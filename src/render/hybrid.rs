use crate::display::{DisplayServer, TextureDraw};
use crate::foundation::core::Rect;
use crate::foundation::error::WincompResult;
use crate::region::Region;
use crate::render::backend::{
    BackendKind, BlurRequest, PaintSource, RenderBackend, RenderRequest,
};
use crate::render::binding::SurfaceBinding;
use crate::render::xrender::XRenderBackend;
use crate::session::opts::CompositorOpts;

/// Composes like [`XRenderBackend`], then binds the composed target as a texture and puts it
/// on screen through the accelerated context.
#[derive(Debug, Default)]
pub struct HybridBackend {
    compose: XRenderBackend,
    ready: bool,
}

impl HybridBackend {
    /// Backend with no resources yet; call [`RenderBackend::init`] first.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for HybridBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hybrid
    }

    fn uses_pictures(&self) -> bool {
        true
    }

    fn has_gl_context(&self) -> bool {
        self.ready
    }

    fn init(&mut self, server: &mut dyn DisplayServer, opts: &CompositorOpts) -> WincompResult<()> {
        self.compose.init(server, opts)?;
        if let Err(err) = server.gl_init() {
            self.compose.deinit(server);
            return Err(err);
        }
        self.ready = true;
        Ok(())
    }

    fn deinit(&mut self, server: &mut dyn DisplayServer) {
        self.compose.deinit(server);
        self.ready = false;
    }

    fn frame_start(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &SurfaceBinding,
        damage: &Region,
    ) -> WincompResult<()> {
        self.compose.frame_start(server, target, damage)
    }

    fn set_clip(&mut self, server: &mut dyn DisplayServer, region: &Region) {
        self.compose.set_clip(server, region);
    }

    fn begin_paint(
        &mut self,
        server: &mut dyn DisplayServer,
        binding: &SurfaceBinding,
        width: i32,
        height: i32,
        has_alpha: bool,
        invert: bool,
    ) -> PaintSource {
        self.compose
            .begin_paint(server, binding, width, height, has_alpha, invert)
    }

    fn render(
        &mut self,
        server: &mut dyn DisplayServer,
        source: &PaintSource,
        req: &RenderRequest<'_>,
    ) {
        self.compose.render(server, source, req);
    }

    fn dim(&mut self, server: &mut dyn DisplayServer, rect: Rect, opacity: f64, region: &Region) {
        self.compose.dim(server, rect, opacity, region);
    }

    fn blur(&mut self, server: &mut dyn DisplayServer, req: &BlurRequest<'_>) -> bool {
        self.compose.blur(server, req)
    }

    fn present(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &mut SurfaceBinding,
        damage: &Region,
        use_glfinish: bool,
        no_rebind: bool,
    ) {
        let (w, h) = server.root_size();
        let depth = server.root_depth();
        server.sync();
        server.gl_wait(use_glfinish);
        if target.bind_texture(server, w, h, depth, !no_rebind) {
            server.gl_wait(use_glfinish);
            match target.texture() {
                Some(texture) => server.gl_draw_texture(&TextureDraw {
                    texture,
                    src_x: 0,
                    src_y: 0,
                    dst_x: 0,
                    dst_y: 0,
                    width: w,
                    height: h,
                    z: 0.0,
                    opacity: 1.0,
                    argb: false,
                    invert: false,
                    region: Some(damage),
                }),
                None => tracing::error!("composed frame has no texture"),
            }
        }
        server.gl_swap_buffers();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/hybrid.rs"]
mod tests;
