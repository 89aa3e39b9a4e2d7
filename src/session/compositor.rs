use crate::display::{CONVOLUTION_FILTER, DisplayServer, PictFormat, PictOp};
use crate::effects::blur::{BlurKernel, BlurKernelCache};
use crate::effects::kernel::GaussianMap;
use crate::effects::shadow::build_shadow;
use crate::foundation::core::Rect;
use crate::foundation::error::{WincompError, WincompResult};
use crate::region::Region;
use crate::render::alpha::solid_picture;
use crate::render::backend::{
    BackendKind, BlurRequest, PaintSource, RenderBackend, RenderRequest, create_backend,
};
use crate::render::binding::{BufferSource, ResourceGuard, SurfaceBinding};
use crate::session::opts::CompositorOpts;
use crate::session::paint::paint_one;
use crate::session::present::FramePacer;
use crate::session::window::{FadeObserver, Window};

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameStats {
    /// Window bodies painted.
    pub windows_painted: usize,
    /// Shadows painted.
    pub shadows_painted: usize,
    /// Background blurs applied.
    pub blurs_applied: usize,
    /// Windows or shadows skipped because their resources were unavailable.
    pub degraded: usize,
}

enum Outcome {
    Skipped,
    Painted,
    Failed,
}

/// One compositing session: the chosen backend plus every resource shared across frames.
pub struct Compositor {
    opts: CompositorOpts,
    backend: Box<dyn RenderBackend>,
    pacer: FramePacer,
    screen: Rect,
    target: SurfaceBinding,
    root_tile: SurfaceBinding,
    root_tile_owned: bool,
    shadow_color: SurfaceBinding,
    shadow_exclude: Region,
    gaussian: GaussianMap,
    blur_kernels: Vec<BlurKernel>,
    blur_cache: BlurKernelCache,
    blur_enabled: bool,
}

impl Compositor {
    /// Start a session on `server`.
    ///
    /// Fails when the options are invalid or the backend cannot be set up. Missing optional
    /// capabilities (vblank waits, the convolution filter) only disable their feature.
    #[tracing::instrument(skip_all, fields(backend = opts.backend.name()))]
    pub fn new(server: &mut dyn DisplayServer, opts: CompositorOpts) -> WincompResult<Self> {
        opts.validate()?;
        let blur_kernels = if opts.blur.background {
            opts.blur.kernels()?
        } else {
            Vec::new()
        };
        let gaussian = GaussianMap::new(opts.shadow.radius)?;

        let mut backend = create_backend(opts.backend)?;
        backend.init(server, &opts)?;
        let shadow_color = match solid_picture(server, true, opts.shadow.color()) {
            Ok(binding) => binding,
            Err(err) => {
                backend.deinit(server);
                return Err(err);
            }
        };

        let mut blur_enabled = opts.blur.background;
        if blur_enabled && backend.uses_pictures() && !server.query_filter(CONVOLUTION_FILTER) {
            tracing::error!(
                filter = CONVOLUTION_FILTER,
                "display server lacks the blur filter, background blur disabled"
            );
            blur_enabled = false;
        }

        let pacer = FramePacer::new(server, &opts);
        let (width, height) = server.root_size();
        let shadow_exclude = Region::from_rects(opts.shadow.exclude.iter().copied());
        tracing::debug!(width, height, blur_enabled, "compositor ready");
        Ok(Self {
            opts,
            backend,
            pacer,
            screen: Rect::new(0, 0, width, height),
            target: SurfaceBinding::new(),
            root_tile: SurfaceBinding::new(),
            root_tile_owned: false,
            shadow_color,
            shadow_exclude,
            gaussian,
            blur_kernels,
            blur_cache: BlurKernelCache::new(),
            blur_enabled,
        })
    }

    /// Options in effect.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Active backend variant.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Screen rectangle.
    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Frame target handles.
    pub fn target(&self) -> &SurfaceBinding {
        &self.target
    }

    /// Whether background blur is active this session.
    pub fn blur_enabled(&self) -> bool {
        self.blur_enabled
    }

    /// Derived blur kernels.
    pub fn blur_cache(&self) -> &BlurKernelCache {
        &self.blur_cache
    }

    /// Resolve a window's shadow geometry and opacity from the session options.
    pub fn prepare_window(&self, w: &mut Window) {
        w.update_shadow(&self.opts.shadow);
    }

    /// Compose and present one frame.
    ///
    /// `windows` is ordered bottom to top; `damage` of `None` repaints the whole screen. The
    /// only error that stops a frame is a frame target that cannot be allocated; every other
    /// failure skips the affected surface and is counted in [`FrameStats::degraded`].
    #[tracing::instrument(skip_all, fields(windows = windows.len()))]
    pub fn paint_all(
        &mut self,
        server: &mut dyn DisplayServer,
        windows: &mut [Window],
        damage: Option<&Region>,
        observer: &mut dyn FadeObserver,
    ) -> WincompResult<FrameStats> {
        let mut stats = FrameStats::default();
        if self.opts.sync_fence && !server.fence_sync() {
            tracing::error!("fence sync failed, disabled for this session");
            self.opts.sync_fence = false;
        }

        let screen = Region::from_rect(self.screen);
        let damage = match damage {
            Some(damage) => damage.and(&screen),
            None => screen.clone(),
        };

        self.ensure_target(server)?;
        self.backend.frame_start(server, &self.target, &damage)?;

        let mut root_region = damage.clone();
        if let Some(bottom) = windows.first() {
            root_region.subtract(&bottom.reg_ignore);
        }
        self.backend.set_clip(server, &root_region);
        self.paint_root(server, &root_region);

        for w in windows.iter_mut() {
            self.paint_window(server, w, &damage, &mut stats);
        }

        self.pacer.present(
            server,
            self.backend.as_mut(),
            &mut self.target,
            &screen,
            &damage,
        );

        for w in windows.iter_mut() {
            observer.fade_check(w);
        }
        tracing::debug!(?stats, "frame presented");
        Ok(stats)
    }

    fn ensure_target(&mut self, server: &mut dyn DisplayServer) -> WincompResult<()> {
        if self.backend.is_valid(&self.target) {
            return Ok(());
        }
        let depth = server.root_depth();
        if self.target.pixmap().is_none() {
            let (width, height) = (self.screen.width, self.screen.height);
            let source = BufferSource::Offscreen {
                depth,
                width,
                height,
            };
            if let Err(err) = self.target.ensure_buffer(server, source) {
                tracing::error!(%err, width, height, "cannot allocate the frame buffer");
                return Err(WincompError::frame_buffer(format!(
                    "cannot allocate {width}x{height} frame buffer: {err}"
                )));
            }
        }
        if self.backend.uses_pictures()
            && let Err(err) = self
                .target
                .ensure_target(server, PictFormat::for_depth(depth))
        {
            tracing::error!(%err, "cannot create the frame buffer picture");
            return Err(WincompError::frame_buffer(format!(
                "cannot create frame buffer picture: {err}"
            )));
        }
        Ok(())
    }

    fn paint_root(&mut self, server: &mut dyn DisplayServer, region: &Region) {
        if self.root_tile.pixmap().is_none()
            && let Err(err) = self.create_root_tile(server)
        {
            tracing::error!(%err, "failed to create the root tile");
            return;
        }
        if !self
            .backend
            .bind_texture(server, &mut self.root_tile, 0, 0, 0, false)
        {
            return;
        }
        let source = PaintSource::of(&self.root_tile, false);
        self.backend.render(
            server,
            &source,
            &RenderRequest {
                src_x: 0,
                src_y: 0,
                dst_x: 0,
                dst_y: 0,
                width: self.screen.width,
                height: self.screen.height,
                opacity: 1.0,
                argb: false,
                region,
            },
        );
    }

    fn create_root_tile(&mut self, server: &mut dyn DisplayServer) -> WincompResult<()> {
        let depth = server.root_depth();
        let format = PictFormat::for_depth(depth);

        let mut probed = None;
        if self.opts.background.probe_root
            && let Some(pixmap) = server.root_background_pixmap()
        {
            if server.validate_pixmap(pixmap) {
                probed = Some(pixmap);
            } else {
                tracing::debug!(?pixmap, "stale root background pixmap ignored");
            }
        }

        if let Some(pixmap) = probed {
            let picture = server.create_picture(pixmap, format, true)?;
            let (width, height) = server
                .pixmap_geometry(pixmap)
                .map_or((0, 0), |(w, h, _)| (w, h));
            self.root_tile = SurfaceBinding::from_parts(pixmap, picture, width, height);
            self.root_tile_owned = false;
            return Ok(());
        }

        let mut guard = ResourceGuard::new(server);
        let pixmap = guard.create_pixmap(depth, 1, 1)?;
        let picture = guard.create_picture(pixmap, format, true)?;
        guard.server().fill_rectangles(
            PictOp::Src,
            picture,
            self.opts.background.fallback,
            &[Rect::new(0, 0, 1, 1)],
        );
        guard.keep_pixmap(pixmap);
        guard.keep_picture(picture);
        self.root_tile = SurfaceBinding::from_parts(pixmap, picture, 1, 1);
        self.root_tile_owned = true;
        Ok(())
    }

    fn free_root_tile(&mut self, server: &mut dyn DisplayServer) {
        if self.root_tile_owned {
            self.root_tile.free(server);
        } else {
            self.root_tile.detach(server);
        }
        self.root_tile_owned = false;
    }

    fn paint_window(
        &mut self,
        server: &mut dyn DisplayServer,
        w: &mut Window,
        damage: &Region,
        stats: &mut FrameStats,
    ) {
        let bshape = w.bounding_shape_global();
        if w.shadow && self.opts.shadow.enabled {
            match self.paint_shadow(server, w, damage, &bshape) {
                Outcome::Painted => stats.shadows_painted += 1,
                Outcome::Failed => stats.degraded += 1,
                Outcome::Skipped => {}
            }
        }

        let mut region = damage.minus(&w.reg_ignore);
        region.intersect(&bshape);
        if region.is_empty() {
            return;
        }
        self.backend.set_clip(server, &region);

        if self.wants_blur(w) && self.blur_behind(server, w, &region) {
            stats.blurs_applied += 1;
        }
        if paint_one(self.backend.as_mut(), server, &self.opts, w, &region) {
            stats.windows_painted += 1;
        } else {
            stats.degraded += 1;
        }
    }

    fn paint_shadow(
        &mut self,
        server: &mut dyn DisplayServer,
        w: &mut Window,
        damage: &Region,
        bshape: &Region,
    ) -> Outcome {
        let geometry = w.shadow_geometry;
        let mut region = damage.minus(&w.reg_ignore);
        region.subtract(&self.shadow_exclude);
        region.intersect_rect(geometry.rect_at(w.x, w.y));
        if !w.full_shadow {
            region.subtract(bshape);
        }
        if region.is_empty() {
            return Outcome::Skipped;
        }

        if w.shadow_paint.pixmap().is_none() {
            let Some(color) = self.shadow_color.picture() else {
                return Outcome::Failed;
            };
            match build_shadow(server, &self.gaussian, color, w.width, w.height) {
                Ok(binding) => w.shadow_paint = binding,
                Err(err) => {
                    tracing::error!(window = ?w.id, %err, "failed to build shadow");
                    return Outcome::Failed;
                }
            }
        }

        self.backend.set_clip(server, &region);
        self.backend
            .bind_texture(server, &mut w.shadow_paint, 0, 0, 32, false);
        if !self.backend.is_valid(&w.shadow_paint) {
            tracing::error!(window = ?w.id, "shadow has no painting data, skipped");
            return Outcome::Failed;
        }
        let source = PaintSource::of(&w.shadow_paint, false);
        self.backend.render(
            server,
            &source,
            &RenderRequest {
                src_x: 0,
                src_y: 0,
                dst_x: w.x + geometry.dx,
                dst_y: w.y + geometry.dy,
                width: geometry.width,
                height: geometry.height,
                opacity: w.shadow_opacity,
                argb: true,
                region: &region,
            },
        );
        Outcome::Painted
    }

    fn wants_blur(&self, w: &Window) -> bool {
        self.blur_enabled
            && w.blur_background
            && (!w.is_solid(self.opts.force_win_blend)
                || (self.opts.blur.frame && w.frame_opacity != 1.0))
    }

    fn blur_behind(&mut self, server: &mut dyn DisplayServer, w: &Window, region: &Region) -> bool {
        let mut clip = w.bounding_shape.clone();
        if w.is_solid(self.opts.force_win_blend) {
            clip.subtract(&w.region_noframe_local());
        }
        if clip.is_empty() {
            return false;
        }
        let kernels = self
            .blur_cache
            .update(&self.blur_kernels, w.opacity, self.opts.blur.fixed);
        let done = self.backend.blur(
            server,
            &BlurRequest {
                area: w.rect(),
                kernels,
                clip: &clip,
                region,
            },
        );
        if !done {
            tracing::warn!(window = ?w.id, "background blur skipped");
        }
        done
    }

    /// Release every handle a window holds. Safe to call more than once.
    pub fn free_window(&mut self, server: &mut dyn DisplayServer, w: &mut Window) {
        w.paint.free(server);
        w.shadow_paint.free(server);
    }

    /// Drop a window's cached shadow so the next frame rebuilds it.
    pub fn invalidate_shadow(&mut self, server: &mut dyn DisplayServer, w: &mut Window) {
        w.shadow_paint.free(server);
    }

    /// Drop the cached root tile, e.g. after the desktop background changed.
    pub fn invalidate_root_tile(&mut self, server: &mut dyn DisplayServer) {
        self.free_root_tile(server);
    }

    /// Pick up a new root size; the frame target and root tile are rebuilt on the next frame.
    pub fn resize(&mut self, server: &mut dyn DisplayServer) {
        let (width, height) = server.root_size();
        self.screen = Rect::new(0, 0, width, height);
        self.target.free(server);
        self.free_root_tile(server);
        tracing::debug!(width, height, "screen resized");
    }

    /// Release every session resource. Safe to call more than once.
    pub fn deinit(&mut self, server: &mut dyn DisplayServer) {
        self.target.free(server);
        self.free_root_tile(server);
        self.shadow_color.free(server);
        self.blur_cache.clear();
        self.backend.deinit(server);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/compositor.rs"]
mod tests;
