//! Display-server contract.
//!
//! The compositor never talks to a display server directly; it issues the requests below in
//! strict program order through [`DisplayServer`]. [`memory::MemoryServer`] is a complete
//! software implementation used by the CLI and the tests.

use crate::foundation::core::{Color, Rect};
use crate::foundation::error::WincompResult;
use crate::foundation::math::Fixed;
use crate::region::Region;

pub mod memory;
pub(crate) mod raster;

/// Name of the server-side convolution filter the blur engine requires.
pub const CONVOLUTION_FILTER: &str = "convolution";

/// Server-side pixel buffer handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixmapId(pub u32);

/// Compositing target ("picture") handle, always derived from a pixmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureId(pub u32);

/// Bound GPU texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Top-level window id.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct WindowId(pub u32);

/// Pixel formats pictures can be created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PictFormat {
    /// 32-bit premultiplied ARGB.
    Argb32,
    /// 24-bit RGB; alpha reads as opaque.
    Rgb24,
    /// 8-bit alpha only.
    A8,
}

impl PictFormat {
    /// Pixmap depth matching this format.
    pub fn depth(self) -> u8 {
        match self {
            PictFormat::Argb32 => 32,
            PictFormat::Rgb24 => 24,
            PictFormat::A8 => 8,
        }
    }

    /// Format for a pixmap of the given depth.
    pub fn for_depth(depth: u8) -> Self {
        match depth {
            32 => PictFormat::Argb32,
            8 => PictFormat::A8,
            _ => PictFormat::Rgb24,
        }
    }

    /// Whether pixels carry their own alpha.
    pub fn has_alpha(self) -> bool {
        !matches!(self, PictFormat::Rgb24)
    }
}

/// Porter-Duff / blend operators used by the compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PictOp {
    /// Replace destination with source.
    Src,
    /// Source over destination.
    Over,
    /// Separable difference blend.
    Difference,
    /// Destination scaled by source alpha.
    InReverse,
}

/// Sampling filter set on a source picture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter<'a> {
    /// Nearest-neighbour sampling (the reset state).
    Nearest,
    /// Convolution with a fixed-point kernel laid out as `[w, h, weights...]`.
    Convolution(&'a [Fixed]),
}

/// One `composite` request. Coordinates are in each picture's own space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeArgs {
    /// Blend rule between the masked source and the destination.
    pub op: PictOp,
    /// Picture read from.
    pub src: PictureId,
    /// A8 picture scaling the source alpha; `None` means fully opaque.
    pub mask: Option<PictureId>,
    /// Picture written to; its clip limits the writes.
    pub dst: PictureId,
    /// Left edge of the area read from `src`.
    pub src_x: i32,
    /// Top edge of the area read from `src`.
    pub src_y: i32,
    /// Left edge of the area read from `mask`.
    pub mask_x: i32,
    /// Top edge of the area read from `mask`.
    pub mask_y: i32,
    /// Left edge of the area written in `dst`.
    pub dst_x: i32,
    /// Top edge of the area written in `dst`.
    pub dst_y: i32,
    /// Columns copied, shared by all three pictures.
    pub width: i32,
    /// Rows copied, shared by all three pictures.
    pub height: i32,
}

impl CompositeArgs {
    /// Composite the whole `width × height` area from `(0,0)` to `(0,0)` without mask.
    pub fn copy(op: PictOp, src: PictureId, dst: PictureId, width: i32, height: i32) -> Self {
        Self {
            op,
            src,
            mask: None,
            dst,
            src_x: 0,
            src_y: 0,
            mask_x: 0,
            mask_y: 0,
            dst_x: 0,
            dst_y: 0,
            width,
            height,
        }
    }

    /// Destination rectangle touched by this request.
    pub fn dst_rect(&self) -> Rect {
        Rect::new(self.dst_x, self.dst_y, self.width, self.height)
    }
}

/// One textured-quad draw into the accelerated context.
#[derive(Clone, Copy, Debug)]
pub struct TextureDraw<'a> {
    /// Texture to sample.
    pub texture: TextureId,
    /// Texel column mapped to the quad's left edge.
    pub src_x: i32,
    /// Texel row mapped to the quad's top edge.
    pub src_y: i32,
    /// Framebuffer column of the quad's left edge.
    pub dst_x: i32,
    /// Framebuffer row of the quad's top edge.
    pub dst_y: i32,
    /// Quad size in pixels; no scaling is applied.
    pub width: i32,
    /// See `width`.
    pub height: i32,
    /// Depth of the quad; later draws carry larger values.
    pub z: f32,
    /// Multiplier on every sampled channel, premultiplied.
    pub opacity: f64,
    /// Whether the texture alpha channel is meaningful.
    pub argb: bool,
    /// Invert colors while drawing.
    pub invert: bool,
    /// Optional region (framebuffer coordinates) limiting the draw.
    pub region: Option<&'a Region>,
}

/// Requests the compositing core issues against the display server.
///
/// Creation calls return [`crate::WincompError::Resource`] on failure; release calls accept
/// handles that are already gone.
pub trait DisplayServer {
    /// Root window size in pixels.
    fn root_size(&self) -> (i32, i32);

    /// Root window depth.
    fn root_depth(&self) -> u8;

    /// The on-screen target picture.
    fn root_picture(&self) -> PictureId;

    /// Allocate a pixmap.
    fn create_pixmap(&mut self, depth: u8, width: i32, height: i32) -> WincompResult<PixmapId>;

    /// Release a pixmap.
    fn free_pixmap(&mut self, pixmap: PixmapId);

    /// Return `true` when `pixmap` refers to a live pixmap.
    fn validate_pixmap(&mut self, pixmap: PixmapId) -> bool;

    /// Size and depth of a pixmap.
    fn pixmap_geometry(&self, pixmap: PixmapId) -> Option<(i32, i32, u8)>;

    /// Name the offscreen pixmap backing a redirected window.
    fn name_window_pixmap(&mut self, window: WindowId) -> WincompResult<PixmapId>;

    /// Pixmap published on the root window as desktop background, if any.
    fn root_background_pixmap(&mut self) -> Option<PixmapId>;

    /// Upload an 8-bit image into a depth-8 pixmap.
    fn put_image_a8(
        &mut self,
        pixmap: PixmapId,
        width: i32,
        height: i32,
        data: &[u8],
    ) -> WincompResult<()>;

    /// Create a picture over a pixmap.
    fn create_picture(
        &mut self,
        pixmap: PixmapId,
        format: PictFormat,
        repeat: bool,
    ) -> WincompResult<PictureId>;

    /// Release a picture.
    fn free_picture(&mut self, picture: PictureId);

    /// Composite `src` (through `mask`) onto `dst`.
    fn composite(&mut self, args: &CompositeArgs);

    /// Fill rectangles of `dst` with a straight-alpha color.
    fn fill_rectangles(&mut self, op: PictOp, dst: PictureId, color: Color, rects: &[Rect]);

    /// Set the sampling filter of a picture.
    fn set_picture_filter(&mut self, picture: PictureId, filter: Filter<'_>);

    /// Restrict writes to `picture` to `region`, offset by `(x_origin, y_origin)`.
    fn set_picture_clip_region(
        &mut self,
        picture: PictureId,
        x_origin: i32,
        y_origin: i32,
        region: &Region,
    );

    /// Return `true` when the named picture filter is supported.
    fn query_filter(&mut self, name: &str) -> bool;

    /// Create the accelerated rendering context.
    fn gl_init(&mut self) -> WincompResult<()>;

    /// Bind `pixmap` as a texture. Zero sizes mean "ask the server".
    fn bind_texture(
        &mut self,
        pixmap: PixmapId,
        width: i32,
        height: i32,
        depth: u8,
    ) -> WincompResult<TextureId>;

    /// Release a texture.
    fn release_texture(&mut self, texture: TextureId);

    /// Restrict accelerated draws to `region`.
    fn gl_set_clip(&mut self, region: &Region);

    /// Draw a textured quad.
    fn gl_draw_texture(&mut self, draw: &TextureDraw<'_>);

    /// Darken a framebuffer rectangle by blending black at `opacity`.
    fn gl_dim(&mut self, rect: Rect, z: f32, opacity: f64, region: Option<&Region>);

    /// Copy a framebuffer rectangle into a fresh texture.
    fn gl_copy_to_texture(&mut self, rect: Rect) -> WincompResult<TextureId>;

    /// Run one convolution pass over a texture.
    fn gl_convolve_texture(&mut self, texture: TextureId, kernel: &[Fixed]) -> WincompResult<()>;

    /// Wait for accelerated rendering: `glFinish` when `finish`, otherwise flush.
    fn gl_wait(&mut self, finish: bool);

    /// Swap the accelerated back buffer onto the screen.
    fn gl_swap_buffers(&mut self);

    /// Prepare the vblank wait method. `false` when none is usable.
    fn init_vsync(&mut self) -> bool;

    /// Block until the next vertical blank.
    fn wait_vblank(&mut self) -> WincompResult<()>;

    /// Trigger and await the rendering fence. `false` on failure.
    fn fence_sync(&mut self) -> bool;

    /// Round-trip: wait until every previous request is processed.
    fn sync(&mut self);

    /// Push buffered requests to the server.
    fn flush(&mut self);
}
