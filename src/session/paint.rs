use smallvec::SmallVec;

use crate::display::DisplayServer;
use crate::foundation::core::{Margins, Rect};
use crate::region::Region;
use crate::render::backend::{RenderBackend, RenderRequest};
use crate::render::binding::BufferSource;
use crate::session::opts::CompositorOpts;
use crate::session::window::Window;

/// One window-local piece of a split paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePiece {
    /// Area in window-local coordinates.
    pub rect: Rect,
    /// Painted at frame opacity rather than body opacity.
    pub frame: bool,
}

/// Split a `width × height` window into frame margins and body.
///
/// Margins are clamped so that together they never exceed the window; pieces with no area
/// are left out, so the result holds at most five disjoint rectangles covering the window.
pub fn frame_regions(width: i32, height: i32, margins: Margins) -> SmallVec<[FramePiece; 5]> {
    let mut out: SmallVec<[FramePiece; 5]> = SmallVec::new();
    let mut push = |x: i32, y: i32, w: i32, h: i32, frame: bool| {
        if w > 0 && h > 0 {
            out.push(FramePiece {
                rect: Rect::new(x, y, w, h),
                frame,
            });
        }
    };

    let mut body_h = height;
    let ctop = margins.top.max(0).min(body_h);
    push(0, 0, width, ctop, true);
    body_h -= ctop;

    let cbot = margins.bottom.max(0).min(body_h.max(0));
    push(0, height - cbot, width, cbot, true);
    body_h -= cbot;

    let mut body_w = width;
    let cleft = margins.left.max(0).min(body_w.max(0));
    push(0, ctop, cleft, body_h, true);
    body_w -= cleft;

    let cright = margins.right.max(0).min(body_w.max(0));
    push(width - cright, ctop, cright, body_h, true);
    body_w -= cright;

    push(cleft, ctop, body_w, body_h, false);
    out
}

/// Paint one window's body into the frame, clipped to `region`.
///
/// Returns `false` when the window had nothing paintable this frame.
pub(crate) fn paint_one(
    backend: &mut dyn RenderBackend,
    server: &mut dyn DisplayServer,
    opts: &CompositorOpts,
    w: &mut Window,
    region: &Region,
) -> bool {
    if let Err(err) = w.paint.ensure_buffer(server, BufferSource::Window(w.id)) {
        tracing::error!(window = ?w.id, %err, "failed to get window pixmap");
        return false;
    }
    if backend.uses_pictures()
        && let Err(err) = w.paint.ensure_target(server, w.pict_format())
    {
        tracing::error!(window = ?w.id, %err, "failed to create window picture");
    }

    let force = !opts.glx_no_rebind_pixmap && w.pixmap_damaged;
    if !backend.bind_texture(server, &mut w.paint, 0, 0, 0, force) {
        tracing::error!(window = ?w.id, "failed to bind window texture");
    }
    w.pixmap_damaged = false;

    if !backend.is_valid(&w.paint) {
        tracing::error!(window = ?w.id, "window has no painting data, skipped");
        return false;
    }

    let source = backend.begin_paint(
        server,
        &w.paint,
        w.width,
        w.height,
        w.has_alpha,
        w.invert_color,
    );
    let opacity = w.opacity;
    let argb = w.has_alpha || opts.force_win_blend;
    let pieces = if w.frame_opacity == 1.0 {
        SmallVec::from_elem(
            FramePiece {
                rect: Rect::new(0, 0, w.width, w.height),
                frame: false,
            },
            1,
        )
    } else {
        frame_regions(w.width, w.height, w.frame_extents())
    };
    for piece in &pieces {
        let piece_opacity = if piece.frame {
            w.frame_opacity * opacity
        } else {
            opacity
        };
        backend.render(
            server,
            &source,
            &RenderRequest {
                src_x: piece.rect.x,
                src_y: piece.rect.y,
                dst_x: w.x + piece.rect.x,
                dst_y: w.y + piece.rect.y,
                width: piece.rect.width,
                height: piece.rect.height,
                opacity: piece_opacity,
                argb,
                region,
            },
        );
    }
    backend.end_paint(server, source);

    if w.dim {
        let mut dim = opts.dim.inactive;
        if !opts.dim.fixed {
            dim *= opacity;
        }
        backend.dim(server, w.rect(), dim, region);
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/session/paint.rs"]
mod tests;
