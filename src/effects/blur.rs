//! Background blur: convolution kernels, the opacity-linked center weight, the derived kernel
//! cache and the ping-pong blur over a target picture.

use crate::display::{CompositeArgs, DisplayServer, Filter, PictFormat, PictOp, PictureId};
use crate::foundation::core::Rect;
use crate::foundation::error::{WincompError, WincompResult};
use crate::foundation::math::{Fixed, double_to_fixed, fixed_to_double};
use crate::region::Region;
use crate::render::binding::ResourceGuard;

/// Upper bound on kernel slots; at most `MAX_BLUR_PASS - 1` kernels are used.
pub const MAX_BLUR_PASS: usize = 5;

const PRESETS: &[(&str, &str)] = &[
    ("3x3box", "3,3,1,1,1,1,1,1,1,1,"),
    (
        "5x5box",
        "5,5,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,",
    ),
    (
        "7x7box",
        "7,7,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,",
    ),
    (
        "3x3gaussian",
        "3,3,0.243117,0.493069,0.243117,0.493069,0.493069,0.243117,0.493069,0.243117,",
    ),
    (
        "5x5gaussian",
        "5,5,0.003493,0.029143,0.059106,0.029143,0.003493,0.029143,0.243117,0.493069,0.243117,0.029143,0.059106,0.493069,0.493069,0.059106,0.029143,0.243117,0.493069,0.243117,0.029143,0.003493,0.029143,0.059106,0.029143,0.003493,",
    ),
    (
        "7x7gaussian",
        "7,7,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.001723,0.059106,0.493069,0.493069,0.059106,0.001723,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,",
    ),
    (
        "9x9gaussian",
        "9,9,0.000000,0.000000,0.000001,0.000006,0.000012,0.000006,0.000001,0.000000,0.000000,0.000000,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,0.000000,0.000001,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000001,0.000006,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.000006,0.000012,0.001723,0.059106,0.493069,0.493069,0.059106,0.001723,0.000012,0.000006,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.000006,0.000001,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000001,0.000000,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,0.000000,0.000000,0.000000,0.000001,0.000006,0.000012,0.000006,0.000001,0.000000,0.000000,",
    ),
    (
        "11x11gaussian",
        "11,11,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000001,0.000006,0.000012,0.000006,0.000001,0.000000,0.000000,0.000000,0.000000,0.000000,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,0.000000,0.000000,0.000000,0.000001,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000001,0.000000,0.000000,0.000006,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.000006,0.000000,0.000000,0.000012,0.001723,0.059106,0.493069,0.493069,0.059106,0.001723,0.000012,0.000000,0.000000,0.000006,0.000849,0.029143,0.243117,0.493069,0.243117,0.029143,0.000849,0.000006,0.000000,0.000000,0.000001,0.000102,0.003493,0.029143,0.059106,0.029143,0.003493,0.000102,0.000001,0.000000,0.000000,0.000000,0.000003,0.000102,0.000849,0.001723,0.000849,0.000102,0.000003,0.000000,0.000000,0.000000,0.000000,0.000000,0.000001,0.000006,0.000012,0.000006,0.000001,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,0.000000,",
    ),
];

/// Largest accepted kernel side.
pub const MAX_KERNEL_SIDE: usize = 127;

/// Names accepted by [`parse_kernel_list`] in place of an explicit matrix.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

/// Immutable source convolution kernel.
///
/// Dimensions are odd; the center weight is not part of the source and is stored as 0.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurKernel {
    width: usize,
    height: usize,
    weights: Vec<f64>,
}

impl BlurKernel {
    /// Build from row-major weights. The center entry is ignored.
    pub fn new(width: usize, height: usize, mut weights: Vec<f64>) -> WincompResult<Self> {
        if width == 0 || height == 0 || width % 2 == 0 || height % 2 == 0 {
            return Err(WincompError::validation(format!(
                "blur kernel must have odd, positive dimensions, got {width}x{height}"
            )));
        }
        if width > MAX_KERNEL_SIDE || height > MAX_KERNEL_SIDE {
            return Err(WincompError::validation(format!(
                "blur kernel sides are limited to {MAX_KERNEL_SIDE}, got {width}x{height}"
            )));
        }
        if weights.len() != width * height {
            return Err(WincompError::validation(format!(
                "blur kernel {width}x{height} needs {} weights, got {}",
                width * height,
                weights.len()
            )));
        }
        if width > 16 || height > 16 {
            tracing::warn!(width, height, "large blur kernel, rendering may be slow");
        }
        let center = (height / 2) * width + width / 2;
        weights[center] = 0.0;
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// Parse `"w,h,v,v,..."`, where the `w*h - 1` values skip the center element.
    pub fn parse(src: &str) -> WincompResult<Self> {
        let mut nums = src
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| WincompError::validation(format!("not a number in kernel: {s:?}")))
            });
        let mut next = |what: &str| {
            nums.next()
                .unwrap_or_else(|| Err(WincompError::validation(format!("kernel is missing {what}"))))
        };
        let width = next("its width")?;
        let height = next("its height")?;
        let side = |v: f64| {
            let ok = v.fract() == 0.0 && v >= 1.0 && v <= MAX_KERNEL_SIDE as f64 && v % 2.0 == 1.0;
            ok.then_some(v as usize)
        };
        let (Some(width), Some(height)) = (side(width), side(height)) else {
            return Err(WincompError::validation(format!(
                "kernel width/height must be odd integers in 1..={MAX_KERNEL_SIDE}, got {width}x{height}"
            )));
        };
        let len = width
            .checked_mul(height)
            .ok_or_else(|| WincompError::validation("kernel is too large"))?;
        let center = (height / 2) * width + width / 2;
        let mut weights = Vec::with_capacity(len);
        for i in 0..len {
            if i == center {
                weights.push(0.0);
                continue;
            }
            weights.push(next("weights")?);
        }
        if nums.next().is_some() {
            return Err(WincompError::validation("trailing values in kernel"));
        }
        Self::new(width, height, weights)
    }

    /// Kernel width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Kernel height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major weights, center included as 0.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Index of the center weight.
    pub fn center_index(&self) -> usize {
        (self.height / 2) * self.width + self.width / 2
    }

    /// Fixed-point `[w, h, weights...]` with the center replaced by `center`.
    pub fn to_fixed(&self, center: f64) -> Vec<Fixed> {
        let mut out = Vec::with_capacity(self.weights.len() + 2);
        out.push(double_to_fixed(self.width as f64));
        out.push(double_to_fixed(self.height as f64));
        let ci = self.center_index();
        out.extend(
            self.weights
                .iter()
                .enumerate()
                .map(|(i, &w)| double_to_fixed(if i == ci { center } else { w })),
        );
        out
    }
}

/// Parse a preset name or a `;`-separated list of kernels.
pub fn parse_kernel_list(src: &str) -> WincompResult<Vec<BlurKernel>> {
    let src = src.trim();
    if let Some((_, matrix)) = PRESETS.iter().find(|(name, _)| *name == src) {
        return Ok(vec![BlurKernel::parse(matrix)?]);
    }
    let kernels = src
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(BlurKernel::parse)
        .collect::<WincompResult<Vec<_>>>()?;
    if kernels.is_empty() {
        return Err(WincompError::validation("no blur kernel given"));
    }
    if kernels.len() > MAX_BLUR_PASS - 1 {
        return Err(WincompError::validation("too many blur kernels"));
    }
    if kernels.len() > 1 {
        tracing::debug!(passes = kernels.len(), "multi-pass blur");
    }
    Ok(kernels)
}

/// Divide every weight by the weight sum. A zero-sum kernel is left untouched.
pub fn normalize_weights(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        return;
    }
    let factor = 1.0 / sum;
    for w in weights {
        *w *= factor;
    }
}

/// [`normalize_weights`] over fixed-point weights (without the `[w, h]` header).
pub fn normalize_kernel(weights: &mut [Fixed]) {
    let mut values: Vec<f64> = weights.iter().map(|&w| fixed_to_double(w)).collect();
    normalize_weights(&mut values);
    for (dst, v) in weights.iter_mut().zip(values) {
        *dst = double_to_fixed(v);
    }
}

/// Center weight for a window of the given opacity.
///
/// Strength follows opacity unless `fixed`, in which case the factor is 1.
pub fn center_factor(opacity: f64, fixed: bool) -> f64 {
    if fixed {
        return 1.0;
    }
    let pct = 1.0 - opacity * (1.0 - 1.0 / 9.0);
    pct * 8.0 / (1.1 - pct)
}

/// Session-owned normalized, center-adjusted copies of the source kernels.
#[derive(Clone, Debug, Default)]
pub struct BlurKernelCache {
    factor: Option<f64>,
    kernels: Vec<Vec<Fixed>>,
    rebuilds: u64,
}

impl BlurKernelCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernels ready for use, rebuilding them when the center factor for `opacity` differs from
    /// the cached one. With `fixed` strength an existing cache is reused as is.
    pub fn update(&mut self, sources: &[BlurKernel], opacity: f64, fixed: bool) -> &[Vec<Fixed>] {
        let factor = center_factor(opacity, fixed);
        let stale = self.kernels.len() != sources.len()
            || match self.factor {
                None => true,
                Some(cached) => !fixed && cached != factor,
            };
        if stale {
            self.kernels = sources
                .iter()
                .map(|k| {
                    let mut fx = k.to_fixed(factor);
                    normalize_kernel(&mut fx[2..]);
                    fx
                })
                .collect();
            self.factor = Some(factor);
            self.rebuilds += 1;
            tracing::trace!(factor, "rebuilt blur kernels");
        }
        &self.kernels
    }

    /// Current kernels.
    pub fn kernels(&self) -> &[Vec<Fixed>] {
        &self.kernels
    }

    /// Center factor the cache was built for.
    pub fn factor(&self) -> Option<f64> {
        self.factor
    }

    /// How many times the kernels were rebuilt.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Drop the cached kernels.
    pub fn clear(&mut self) {
        self.factor = None;
        self.kernels.clear();
    }
}

/// Blur `area` of `target` in place.
///
/// One intermediate surface of exactly the area's size is used (with `clip` applied to it);
/// each pass reads through the convolution filter from one picture into the other, and the
/// result is copied back when the last pass did not land in `target`. Returns `false` when
/// the intermediate surface cannot be allocated.
pub fn blur_region(
    server: &mut dyn DisplayServer,
    target: PictureId,
    area: Rect,
    kernels: &[Vec<Fixed>],
    clip: Option<&Region>,
) -> bool {
    if kernels.is_empty() || area.is_empty() {
        return false;
    }
    let depth = server.root_depth();
    let mut guard = ResourceGuard::new(server);
    let tmp = match guard
        .create_pixmap(depth, area.width, area.height)
        .and_then(|pixmap| guard.create_picture(pixmap, PictFormat::for_depth(depth), false))
    {
        Ok(picture) => picture,
        Err(err) => {
            tracing::error!(%err, "failed to build intermediate blur surface");
            return false;
        }
    };
    let server = guard.server();
    if let Some(clip) = clip {
        server.set_picture_clip_region(tmp, 0, 0, clip);
    }

    let (mut src, mut dst) = (target, tmp);
    for kernel in kernels.iter().take(MAX_BLUR_PASS - 1) {
        let from_target = src == target;
        let (sx, sy, dx, dy) = if from_target {
            (area.x, area.y, 0, 0)
        } else {
            (0, 0, area.x, area.y)
        };
        server.set_picture_filter(src, Filter::Convolution(kernel));
        server.composite(&CompositeArgs {
            op: PictOp::Src,
            src,
            mask: None,
            dst,
            src_x: sx,
            src_y: sy,
            mask_x: 0,
            mask_y: 0,
            dst_x: dx,
            dst_y: dy,
            width: area.width,
            height: area.height,
        });
        server.set_picture_filter(src, Filter::Nearest);
        std::mem::swap(&mut src, &mut dst);
    }

    if src != target {
        let mut copy = CompositeArgs::copy(PictOp::Src, src, target, area.width, area.height);
        copy.dst_x = area.x;
        copy.dst_y = area.y;
        server.composite(&copy);
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
