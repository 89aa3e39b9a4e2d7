use crate::display::{CompositeArgs, DisplayServer, PictFormat, PictOp, PictureId};
use crate::effects::blur::blur_region;
use crate::foundation::core::{Color, Rect};
use crate::foundation::error::{WincompError, WincompResult};
use crate::region::Region;
use crate::render::alpha::{AlphaPictures, solid_picture};
use crate::render::backend::{
    BackendKind, BlurRequest, PaintSource, RenderBackend, RenderRequest,
};
use crate::render::binding::{BufferSource, SurfaceBinding};
use crate::session::opts::CompositorOpts;

/// Composites every paint into an offscreen target picture through alpha masks, then copies
/// the target onto the root picture.
#[derive(Debug, Default)]
pub struct XRenderBackend {
    alpha: Option<AlphaPictures>,
    white: SurfaceBinding,
    target: Option<PictureId>,
}

impl XRenderBackend {
    /// Backend with no resources yet; call [`RenderBackend::init`] first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picture the current frame is composed into.
    pub fn target(&self) -> Option<PictureId> {
        self.target
    }

    pub(crate) fn inverted_copy(
        &self,
        server: &mut dyn DisplayServer,
        source: PictureId,
        width: i32,
        height: i32,
        has_alpha: bool,
    ) -> WincompResult<SurfaceBinding> {
        let white = self
            .white
            .picture()
            .ok_or_else(|| WincompError::resource("white picture missing"))?;
        let format = if has_alpha {
            PictFormat::Argb32
        } else {
            PictFormat::Rgb24
        };
        let mut tmp = SurfaceBinding::new();
        let built = tmp
            .ensure_buffer(
                server,
                BufferSource::Offscreen {
                    depth: format.depth(),
                    width,
                    height,
                },
            )
            .and_then(|_| tmp.ensure_target(server, format));
        let picture = match built {
            Ok(picture) => picture,
            Err(err) => {
                tmp.free(server);
                return Err(err);
            }
        };
        server.composite(&CompositeArgs::copy(PictOp::Src, source, picture, width, height));
        server.composite(&CompositeArgs::copy(
            PictOp::Difference,
            white,
            picture,
            width,
            height,
        ));
        // Restore the source alpha that the difference against opaque white filled in.
        if has_alpha {
            server.composite(&CompositeArgs::copy(
                PictOp::InReverse,
                source,
                picture,
                width,
                height,
            ));
        }
        Ok(tmp)
    }
}

impl RenderBackend for XRenderBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::XRender
    }

    fn uses_pictures(&self) -> bool {
        true
    }

    fn init(
        &mut self,
        server: &mut dyn DisplayServer,
        opts: &CompositorOpts,
    ) -> WincompResult<()> {
        let mut alpha = AlphaPictures::new(server, opts.max_alpha)?;
        match solid_picture(server, true, Color::WHITE) {
            Ok(white) => self.white = white,
            Err(err) => {
                alpha.free(server);
                return Err(err);
            }
        }
        self.alpha = Some(alpha);
        Ok(())
    }

    fn deinit(&mut self, server: &mut dyn DisplayServer) {
        if let Some(mut alpha) = self.alpha.take() {
            alpha.free(server);
        }
        self.white.free(server);
        self.target = None;
    }

    fn frame_start(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &SurfaceBinding,
        damage: &Region,
    ) -> WincompResult<()> {
        let picture = target
            .picture()
            .ok_or_else(|| WincompError::frame_buffer("target buffer has no picture"))?;
        self.target = Some(picture);
        let root = server.root_picture();
        server.set_picture_clip_region(root, 0, 0, damage);
        Ok(())
    }

    fn set_clip(&mut self, server: &mut dyn DisplayServer, region: &Region) {
        if let Some(target) = self.target {
            server.set_picture_clip_region(target, 0, 0, region);
        }
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
        let mut source = PaintSource::of(binding, false);
        let Some(picture) = binding.picture().filter(|_| invert) else {
            return source;
        };
        match self.inverted_copy(server, picture, width, height, has_alpha) {
            Ok(tmp) => {
                source.picture = tmp.picture();
                source.scratch = Some(tmp);
            }
            Err(err) => tracing::warn!(%err, "cannot invert colors, painting unmodified"),
        }
        source
    }

    fn render(
        &mut self,
        server: &mut dyn DisplayServer,
        source: &PaintSource,
        req: &RenderRequest<'_>,
    ) {
        let (Some(alpha), Some(target)) = (self.alpha.as_ref(), self.target) else {
            tracing::error!("render before the backend is initialized");
            return;
        };
        let step = alpha.step(req.opacity);
        if step == 0 {
            return;
        }
        let Some(src) = source.picture else {
            tracing::error!("render source has no picture");
            return;
        };
        let mask = alpha.picture(step);
        let op = if !req.argb && mask.is_none() {
            PictOp::Src
        } else {
            PictOp::Over
        };
        server.composite(&CompositeArgs {
            op,
            src,
            mask,
            dst: target,
            src_x: req.src_x,
            src_y: req.src_y,
            mask_x: 0,
            mask_y: 0,
            dst_x: req.dst_x,
            dst_y: req.dst_y,
            width: req.width,
            height: req.height,
        });
    }

    fn dim(&mut self, server: &mut dyn DisplayServer, rect: Rect, opacity: f64, _region: &Region) {
        let Some(target) = self.target else {
            return;
        };
        let alpha = (f64::from(u16::MAX) * opacity.clamp(0.0, 1.0)) as u16;
        server.fill_rectangles(
            PictOp::Over,
            target,
            Color::from_u16(0, 0, 0, alpha),
            &[rect],
        );
    }

    fn blur(&mut self, server: &mut dyn DisplayServer, req: &BlurRequest<'_>) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        blur_region(server, target, req.area, req.kernels, Some(req.clip))
    }

    fn present(
        &mut self,
        server: &mut dyn DisplayServer,
        target: &mut SurfaceBinding,
        _damage: &Region,
        _use_glfinish: bool,
        _no_rebind: bool,
    ) {
        let Some(src) = target.picture() else {
            tracing::error!("no composed frame to present");
            return;
        };
        let (w, h) = server.root_size();
        let root = server.root_picture();
        server.composite(&CompositeArgs::copy(PictOp::Src, src, root, w, h));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/xrender.rs"]
mod tests;
