use crate::display::{DisplayServer, TextureDraw};
use crate::effects::blur::MAX_BLUR_PASS;
use crate::foundation::core::Rect;
use crate::foundation::error::WincompResult;
use crate::region::Region;
use crate::render::backend::{
    BackendKind, BlurRequest, PaintSource, RenderBackend, RenderRequest,
};
use crate::render::binding::SurfaceBinding;
use crate::session::opts::CompositorOpts;

/// Offsets below the current depth for effects drawn under the next paint.
const DIM_Z_OFFSET: f32 = 0.7;
const BLUR_Z_OFFSET: f32 = 0.5;

/// Draws window textures straight into the accelerated framebuffer and swaps it on present.
#[derive(Debug, Default)]
pub struct GlxBackend {
    z: f32,
    ready: bool,
}

impl GlxBackend {
    /// Backend with no context yet; call [`RenderBackend::init`] first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth the next paint is drawn at.
    pub fn depth(&self) -> f32 {
        self.z
    }
}

impl RenderBackend for GlxBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Glx
    }

    fn uses_pictures(&self) -> bool {
        false
    }

    fn has_gl_context(&self) -> bool {
        self.ready
    }

    fn init(
        &mut self,
        server: &mut dyn DisplayServer,
        _opts: &CompositorOpts,
    ) -> WincompResult<()> {
        server.gl_init()?;
        self.ready = true;
        Ok(())
    }

    fn deinit(&mut self, _server: &mut dyn DisplayServer) {
        self.ready = false;
        self.z = 0.0;
    }

    fn bind_texture(
        &mut self,
        server: &mut dyn DisplayServer,
        binding: &mut SurfaceBinding,
        width: i32,
        height: i32,
        depth: u8,
        force: bool,
    ) -> bool {
        binding.bind_texture(server, width, height, depth, force)
    }

    fn frame_start(
        &mut self,
        _server: &mut dyn DisplayServer,
        _target: &SurfaceBinding,
        _damage: &Region,
    ) -> WincompResult<()> {
        self.z = 0.0;
        Ok(())
    }

    fn set_clip(&mut self, server: &mut dyn DisplayServer, region: &Region) {
        server.gl_set_clip(region);
    }

    fn render(
        &mut self,
        server: &mut dyn DisplayServer,
        source: &PaintSource,
        req: &RenderRequest<'_>,
    ) {
        match source.texture {
            Some(texture) => server.gl_draw_texture(&TextureDraw {
                texture,
                src_x: req.src_x,
                src_y: req.src_y,
                dst_x: req.dst_x,
                dst_y: req.dst_y,
                width: req.width,
                height: req.height,
                z: self.z,
                opacity: req.opacity,
                argb: req.argb,
                invert: source.invert,
                region: Some(req.region),
            }),
            None => tracing::error!("render source has no texture"),
        }
        self.z += 1.0;
    }

    fn dim(&mut self, server: &mut dyn DisplayServer, rect: Rect, opacity: f64, region: &Region) {
        server.gl_dim(rect, self.z - DIM_Z_OFFSET, opacity, Some(region));
    }

    fn blur(&mut self, server: &mut dyn DisplayServer, req: &BlurRequest<'_>) -> bool {
        if req.kernels.is_empty() || req.area.is_empty() {
            return false;
        }
        let texture = match server.gl_copy_to_texture(req.area) {
            Ok(texture) => texture,
            Err(err) => {
                tracing::error!(%err, "failed to copy the area behind the window");
                return false;
            }
        };
        let mut ok = true;
        for kernel in req.kernels.iter().take(MAX_BLUR_PASS - 1) {
            if let Err(err) = server.gl_convolve_texture(texture, kernel) {
                tracing::error!(%err, "blur pass failed");
                ok = false;
                break;
            }
        }
        if ok {
            let region = req
                .clip
                .clone()
                .translated(req.area.x, req.area.y)
                .and(req.region);
            server.gl_draw_texture(&TextureDraw {
                texture,
                src_x: 0,
                src_y: 0,
                dst_x: req.area.x,
                dst_y: req.area.y,
                width: req.area.width,
                height: req.area.height,
                z: self.z - BLUR_Z_OFFSET,
                opacity: 1.0,
                argb: true,
                invert: false,
                region: Some(&region),
            });
        }
        server.release_texture(texture);
        ok
    }

    fn present(
        &mut self,
        server: &mut dyn DisplayServer,
        _target: &mut SurfaceBinding,
        _damage: &Region,
        _use_glfinish: bool,
        _no_rebind: bool,
    ) {
        server.gl_swap_buffers();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/glx.rs"]
mod tests;
