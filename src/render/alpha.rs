use crate::display::{DisplayServer, PictFormat, PictOp, PictureId};
use crate::foundation::core::{Color, Rect};
use crate::foundation::error::WincompResult;
use crate::render::binding::{ResourceGuard, SurfaceBinding};

/// Create a 1×1 repeating solid picture (ARGB32 when `argb`, A8 otherwise).
pub fn solid_picture(
    server: &mut dyn DisplayServer,
    argb: bool,
    color: Color,
) -> WincompResult<SurfaceBinding> {
    let (depth, format) = if argb {
        (32, PictFormat::Argb32)
    } else {
        (8, PictFormat::A8)
    };
    let mut guard = ResourceGuard::new(server);
    let pixmap = guard.create_pixmap(depth, 1, 1)?;
    let picture = guard.create_picture(pixmap, format, true)?;
    guard
        .server()
        .fill_rectangles(PictOp::Src, picture, color, &[Rect::new(0, 0, 1, 1)]);
    guard.keep_pixmap(pixmap);
    guard.keep_picture(picture);
    Ok(SurfaceBinding::from_parts(pixmap, picture, 1, 1))
}

/// Pre-built alpha masks, one per quantized opacity step.
///
/// Step `i` holds a solid A8 picture of alpha `i / max_alpha`. The fully opaque step needs no
/// mask and has no entry.
#[derive(Debug)]
pub struct AlphaPictures {
    max_alpha: u8,
    entries: Vec<SurfaceBinding>,
}

impl AlphaPictures {
    /// Build the table. On failure every picture created so far is released.
    pub fn new(server: &mut dyn DisplayServer, max_alpha: u8) -> WincompResult<Self> {
        let max_alpha = max_alpha.max(1);
        let mut table = Self {
            max_alpha,
            entries: Vec::with_capacity(usize::from(max_alpha) + 1),
        };
        for step in 0..max_alpha {
            let alpha = f64::from(step) / f64::from(max_alpha);
            match solid_picture(server, false, Color::rgba(0.0, 0.0, 0.0, alpha)) {
                Ok(binding) => table.entries.push(binding),
                Err(err) => {
                    table.free(server);
                    return Err(err);
                }
            }
        }
        table.entries.push(SurfaceBinding::new());
        Ok(table)
    }

    /// Quantize an opacity to a step, truncating.
    pub fn step(&self, opacity: f64) -> usize {
        let step = (opacity.clamp(0.0, 1.0) * f64::from(self.max_alpha)) as usize;
        step.min(usize::from(self.max_alpha))
    }

    /// Mask picture for a step; `None` for the opaque step.
    pub fn picture(&self, step: usize) -> Option<PictureId> {
        self.entries.get(step).and_then(SurfaceBinding::picture)
    }

    /// Release every entry.
    pub fn free(&mut self, server: &mut dyn DisplayServer) {
        for entry in &mut self.entries {
            entry.free(server);
        }
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/alpha.rs"]
mod tests;
