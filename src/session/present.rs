use crate::display::DisplayServer;
use crate::region::Region;
use crate::render::backend::RenderBackend;
use crate::render::binding::SurfaceBinding;
use crate::session::opts::{CompositorOpts, VsyncMode};

/// Orders the end-of-frame requests: vblank waits, backend present, flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePacer {
    vsync: VsyncMode,
    use_glfinish: bool,
    no_rebind: bool,
}

impl FramePacer {
    /// Prepare vblank waiting. When no wait method is usable vsync is turned off.
    pub fn new(server: &mut dyn DisplayServer, opts: &CompositorOpts) -> Self {
        let mut vsync = opts.vsync;
        if vsync != VsyncMode::Off && !server.init_vsync() {
            tracing::error!("no usable vblank wait method, vsync disabled");
            vsync = VsyncMode::Off;
        }
        Self {
            vsync,
            use_glfinish: opts.vsync_use_glfinish,
            no_rebind: opts.glx_no_rebind_pixmap,
        }
    }

    /// Effective vsync mode.
    pub fn vsync(&self) -> VsyncMode {
        self.vsync
    }

    /// Put the composed frame on screen.
    pub fn present(
        &self,
        server: &mut dyn DisplayServer,
        backend: &mut dyn RenderBackend,
        target: &mut SurfaceBinding,
        screen: &Region,
        damage: &Region,
    ) {
        backend.set_clip(server, screen);

        if self.vsync != VsyncMode::Off {
            server.sync();
            if backend.has_gl_context() {
                server.gl_wait(self.use_glfinish);
            }
        }
        if self.vsync == VsyncMode::Conservative {
            self.wait(server);
        }

        backend.present(server, target, damage, self.use_glfinish, self.no_rebind);

        if self.vsync == VsyncMode::Aggressive {
            self.wait(server);
        }
        server.flush();
        if backend.has_gl_context() {
            server.gl_wait(false);
        }
    }

    fn wait(&self, server: &mut dyn DisplayServer) {
        if let Err(err) = server.wait_vblank() {
            tracing::warn!(%err, "vblank wait failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/present.rs"]
mod tests;
