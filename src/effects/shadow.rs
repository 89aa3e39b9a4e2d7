use crate::display::{CompositeArgs, DisplayServer, PictFormat, PictOp, PictureId};
use crate::effects::kernel::{GaussianMap, make_shadow};
use crate::foundation::core::Rect;
use crate::foundation::error::WincompResult;
use crate::render::binding::{ResourceGuard, SurfaceBinding};

/// Placement of a window's shadow relative to the window origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShadowGeometry {
    /// Horizontal offset from the window origin.
    pub dx: i32,
    /// Vertical offset from the window origin.
    pub dy: i32,
    /// Shadow width (window width plus twice the blur radius).
    pub width: i32,
    /// Shadow height (window height plus twice the blur radius).
    pub height: i32,
}

impl ShadowGeometry {
    /// Geometry of the shadow cast by a `width × height` window.
    pub fn for_window(width: i32, height: i32, radius: u32, offset_x: i32, offset_y: i32) -> Self {
        let r = radius as i32;
        Self {
            dx: offset_x,
            dy: offset_y,
            width: width + r * 2,
            height: height + r * 2,
        }
    }

    /// Screen rectangle of the shadow of a window at `(x, y)`.
    pub fn rect_at(&self, x: i32, y: i32) -> Rect {
        Rect::new(x + self.dx, y + self.dy, self.width, self.height)
    }
}

/// Build the colored shadow surface of a `width × height` window.
///
/// The mask is uploaded into an A8 pixmap and `color` (a repeating solid picture) is composited
/// through it into an ARGB32 pixmap. Only the ARGB pixmap and its picture survive; on any error
/// every partial resource is released before returning.
#[tracing::instrument(skip(server, map))]
pub fn build_shadow(
    server: &mut dyn DisplayServer,
    map: &GaussianMap,
    color: PictureId,
    width: i32,
    height: i32,
) -> WincompResult<SurfaceBinding> {
    let mask = make_shadow(map, 1.0, width, height)?;
    let mut guard = ResourceGuard::new(server);
    let mask_pixmap = guard.create_pixmap(8, mask.width, mask.height)?;
    let argb_pixmap = guard.create_pixmap(32, mask.width, mask.height)?;
    let mask_picture = guard.create_picture(mask_pixmap, PictFormat::A8, false)?;
    let argb_picture = guard.create_picture(argb_pixmap, PictFormat::Argb32, false)?;

    guard
        .server()
        .put_image_a8(mask_pixmap, mask.width, mask.height, &mask.data)?;
    let mut args = CompositeArgs::copy(PictOp::Src, color, argb_picture, mask.width, mask.height);
    args.mask = Some(mask_picture);
    guard.server().composite(&args);

    guard.keep_pixmap(argb_pixmap);
    guard.keep_picture(argb_picture);
    Ok(SurfaceBinding::from_parts(
        argb_pixmap,
        argb_picture,
        mask.width,
        mask.height,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shadow.rs"]
mod tests;
