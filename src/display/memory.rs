//! In-memory display server.
//!
//! Every request is rasterized into `vello_cpu::Pixmap` buffers and appended to a call log,
//! so the whole compositing pipeline can run (and be inspected) without a real server.

use std::collections::{HashMap, HashSet};

use crate::display::raster::{self, PixelView, Px};
use crate::display::{
    CompositeArgs, DisplayServer, Filter, PictFormat, PictOp, PictureId, PixmapId, TextureDraw,
    TextureId, WindowId,
};
use crate::foundation::core::{Color, Rect, Rgba8Premul};
use crate::foundation::error::{WincompError, WincompResult};
use crate::foundation::math::{Fixed, opacity_to_u8};
use crate::region::Region;

/// One request received by a [`MemoryServer`], in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerCall {
    /// `create_pixmap` succeeded.
    CreatePixmap {
        /// Handle handed back to the caller.
        pixmap: PixmapId,
        /// Bits per pixel: 8 for masks, 24 or 32 for colour.
        depth: u8,
        /// Requested size, never zero.
        width: i32,
        /// See `width`.
        height: i32,
    },
    /// `free_pixmap`.
    FreePixmap(PixmapId),
    /// `name_window_pixmap` succeeded.
    NameWindowPixmap {
        /// Window whose contents were named.
        window: WindowId,
        /// Pixmap now holding those contents.
        pixmap: PixmapId,
    },
    /// `put_image_a8`.
    PutImage {
        /// A8 pixmap receiving the upload.
        pixmap: PixmapId,
        /// Uploaded rows are this many bytes wide.
        width: i32,
        /// Number of uploaded rows.
        height: i32,
    },
    /// `create_picture` succeeded.
    CreatePicture {
        /// Handle handed back to the caller.
        picture: PictureId,
        /// Pixmap the picture reads and writes.
        pixmap: PixmapId,
        /// How the pixmap bytes are interpreted.
        format: PictFormat,
    },
    /// `free_picture`.
    FreePicture(PictureId),
    /// `composite`.
    Composite(CompositeArgs),
    /// `fill_rectangles`.
    FillRectangles {
        /// Blend rule; `Src` overwrites, `Over` blends.
        op: PictOp,
        /// Picture being filled, subject to its clip.
        dst: PictureId,
        /// Fill color.
        color: Color,
        /// Filled rectangles.
        rects: Vec<Rect>,
    },
    /// `set_picture_filter`; `convolution` is false for the nearest reset.
    SetFilter {
        /// Source picture whose sampling changed.
        picture: PictureId,
        /// Whether a convolution kernel was installed.
        convolution: bool,
    },
    /// `set_picture_clip_region`, with the region already offset.
    SetClip {
        /// Destination picture that was clipped.
        picture: PictureId,
        /// Clip in picture coordinates.
        region: Region,
    },
    /// `bind_texture` succeeded.
    BindTexture {
        /// Handle handed back to the caller.
        texture: TextureId,
        /// Pixmap the texture samples from.
        pixmap: PixmapId,
    },
    /// `release_texture`.
    ReleaseTexture(TextureId),
    /// `gl_set_clip`.
    GlSetClip(Region),
    /// `gl_draw_texture`.
    GlDraw {
        /// Texture that was sampled.
        texture: TextureId,
        /// Framebuffer rectangle covered by the quad.
        dst: Rect,
        /// Depth the quad was drawn at.
        z: f32,
        /// Channel multiplier used for the draw.
        opacity: f64,
        /// Whether colours were inverted.
        invert: bool,
        /// Framebuffer region the draw was limited to, if any.
        region: Option<Region>,
    },
    /// `gl_dim`.
    GlDim {
        /// Framebuffer rectangle darkened.
        rect: Rect,
        /// Depth, just below the window it dims.
        z: f32,
        /// Alpha of the black overlay.
        opacity: f64,
    },
    /// `gl_copy_to_texture` succeeded.
    GlCopyToTexture {
        /// Texture holding the copy.
        texture: TextureId,
        /// Copied framebuffer area.
        rect: Rect,
    },
    /// `gl_convolve_texture`.
    GlConvolve(TextureId),
    /// `gl_wait`.
    GlWait {
        /// `glFinish` rather than flush.
        finish: bool,
    },
    /// `gl_swap_buffers`.
    SwapBuffers,
    /// `wait_vblank`.
    WaitVblank,
    /// `fence_sync`.
    FenceSync,
    /// `sync`.
    Sync,
    /// `flush`.
    Flush,
}

/// Failure switches for exercising error paths.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    /// `create_pixmap` fails for these sizes.
    pub pixmap_sizes: Vec<(i32, i32)>,
    /// `create_pixmap` fails for these depths.
    pub pixmap_depths: Vec<u8>,
    /// `create_picture` fails for these formats.
    pub picture_formats: Vec<PictFormat>,
    /// `name_window_pixmap` fails.
    pub name_window_pixmap: bool,
    /// `bind_texture` fails.
    pub texture_bind: bool,
    /// `gl_copy_to_texture` fails.
    pub gl_copy: bool,
    /// `gl_init` fails.
    pub gl_unavailable: bool,
    /// `init_vsync` reports no method.
    pub vsync_unavailable: bool,
    /// `wait_vblank` fails.
    pub vblank: bool,
    /// `fence_sync` fails.
    pub fence: bool,
}

struct Surface {
    width: u16,
    height: u16,
    depth: u8,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    fn new(width: i32, height: i32, depth: u8) -> WincompResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(WincompError::resource(format!(
                "pixmap size {width}x{height} is empty"
            )));
        }
        let width: u16 = width
            .try_into()
            .map_err(|_| WincompError::resource("pixmap width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| WincompError::resource("pixmap height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            depth,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    fn w(&self) -> i32 {
        i32::from(self.width)
    }

    fn h(&self) -> i32 {
        i32::from(self.height)
    }

    fn view(&self, format: PictFormat, repeat: bool) -> PixelView<'_> {
        PixelView {
            data: self.pixmap.data_as_u8_slice(),
            width: self.w(),
            height: self.h(),
            opaque: format == PictFormat::Rgb24,
            alpha_only: format == PictFormat::A8,
            repeat,
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.w() && y < self.h()
    }

    fn read(&self, x: i32, y: i32, format: PictFormat) -> Px {
        self.view(format, false).sample(x, y)
    }

    fn write(&mut self, x: i32, y: i32, format: PictFormat, px: Px) {
        let idx = ((y * self.w() + x) as usize) * 4;
        let px = match format {
            PictFormat::A8 => [0, 0, 0, px[3]],
            PictFormat::Rgb24 => [px[0], px[1], px[2], 255],
            PictFormat::Argb32 => px,
        };
        self.pixmap.data_as_u8_slice_mut()[idx..idx + 4].copy_from_slice(&px);
    }
}

struct Picture {
    pixmap: PixmapId,
    format: PictFormat,
    repeat: bool,
    filter: Option<Vec<Fixed>>,
    clip: Option<Region>,
}

struct Texture {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

impl Texture {
    fn view(&self, repeat: bool) -> PixelView<'_> {
        PixelView {
            data: &self.data,
            width: self.width,
            height: self.height,
            opaque: false,
            alpha_only: false,
            repeat,
        }
    }
}

struct GlContext {
    framebuffer: Vec<u8>,
    clip: Option<Region>,
}

struct WindowContents {
    width: i32,
    height: i32,
    depth: u8,
    data: Vec<u8>,
}

/// Software [`DisplayServer`] with a call log and failure injection.
pub struct MemoryServer {
    width: i32,
    height: i32,
    next_id: u32,
    screen: PixmapId,
    root_picture: PictureId,
    root_background: Option<PixmapId>,
    external: HashSet<u32>,
    pixmaps: HashMap<u32, Surface>,
    pictures: HashMap<u32, Picture>,
    textures: HashMap<u32, Texture>,
    windows: HashMap<WindowId, WindowContents>,
    filters: Vec<String>,
    gl: Option<GlContext>,
    faults: Faults,
    calls: Vec<ServerCall>,
}

impl MemoryServer {
    /// Server with a 24-bit root window of the given size and no background pixmap.
    pub fn new(width: u16, height: u16) -> Self {
        let mut server = Self {
            width: i32::from(width),
            height: i32::from(height),
            next_id: 1,
            screen: PixmapId(0),
            root_picture: PictureId(0),
            root_background: None,
            external: HashSet::new(),
            pixmaps: HashMap::new(),
            pictures: HashMap::new(),
            textures: HashMap::new(),
            windows: HashMap::new(),
            filters: vec!["nearest".to_owned(), super::CONVOLUTION_FILTER.to_owned()],
            gl: None,
            faults: Faults::default(),
            calls: Vec::new(),
        };
        let screen = PixmapId(server.alloc_id());
        server.pixmaps.insert(
            screen.0,
            Surface {
                width,
                height,
                depth: 24,
                pixmap: vello_cpu::Pixmap::new(width, height),
            },
        );
        let root_picture = PictureId(server.alloc_id());
        server.pictures.insert(
            root_picture.0,
            Picture {
                pixmap: screen,
                format: PictFormat::Rgb24,
                repeat: false,
                filter: None,
                clip: None,
            },
        );
        server.external.insert(screen.0);
        server.screen = screen;
        server.root_picture = root_picture;
        server
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Failure switches.
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Replace the supported picture filter names.
    pub fn set_supported_filters(&mut self, names: &[&str]) {
        self.filters = names.iter().map(|n| (*n).to_owned()).collect();
    }

    /// Register (or replace) a redirected window filled with one premultiplied color.
    ///
    /// 24-bit windows read as opaque.
    pub fn fill_window(
        &mut self,
        window: WindowId,
        width: i32,
        height: i32,
        depth: u8,
        color: Rgba8Premul,
    ) -> WincompResult<()> {
        let count = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .filter(|&(w, h)| w > 0 && h > 0)
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or_else(|| {
                WincompError::validation(format!(
                    "window {window:?}: invalid size {width}x{height}"
                ))
            })?;
        let data = color.to_array().repeat(count);
        self.windows.insert(
            window,
            WindowContents {
                width,
                height,
                depth,
                data,
            },
        );
        Ok(())
    }

    /// Publish a desktop background pixmap owned by another client.
    pub fn set_root_background(
        &mut self,
        width: i32,
        height: i32,
        rgba: &[u8],
    ) -> WincompResult<PixmapId> {
        let mut surface = Surface::new(width, height, 24)?;
        let bytes = surface.pixmap.data_as_u8_slice_mut();
        if rgba.len() != bytes.len() {
            return Err(WincompError::validation("background size mismatch"));
        }
        bytes.copy_from_slice(rgba);
        let id = PixmapId(self.alloc_id());
        self.pixmaps.insert(id.0, surface);
        self.external.insert(id.0);
        self.root_background = Some(id);
        Ok(id)
    }

    /// Publish an arbitrary (possibly stale) pixmap id as the desktop background.
    pub fn set_root_background_pixmap(&mut self, pixmap: Option<PixmapId>) {
        self.root_background = pixmap;
    }

    /// Every call received so far.
    pub fn calls(&self) -> &[ServerCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<ServerCall> {
        std::mem::take(&mut self.calls)
    }

    /// Screen contents as RGBA8 with opaque alpha.
    pub fn screen_rgba(&self) -> Vec<u8> {
        let mut out = self.pixmap_rgba(self.screen).unwrap_or_default();
        for px in out.chunks_exact_mut(4) {
            px[3] = 255;
        }
        out
    }

    /// Raw contents of a pixmap.
    pub fn pixmap_rgba(&self, pixmap: PixmapId) -> Option<Vec<u8>> {
        self.pixmaps
            .get(&pixmap.0)
            .map(|s| s.pixmap.data_as_u8_slice().to_vec())
    }

    /// Raw contents of the pixmap behind a picture.
    pub fn picture_rgba(&self, picture: PictureId) -> Option<Vec<u8>> {
        let p = self.pictures.get(&picture.0)?;
        self.pixmap_rgba(p.pixmap)
    }

    /// Current clip of a picture, if any.
    pub fn picture_clip(&self, picture: PictureId) -> Option<&Region> {
        self.pictures.get(&picture.0)?.clip.as_ref()
    }

    /// Pixmaps created by clients of this server and not yet freed.
    pub fn live_pixmaps(&self) -> usize {
        self.pixmaps
            .keys()
            .filter(|id| !self.external.contains(id))
            .count()
    }

    /// Pictures not yet freed, excluding the root picture.
    pub fn live_pictures(&self) -> usize {
        self.pictures
            .keys()
            .filter(|id| **id != self.root_picture.0)
            .count()
    }

    /// Textures not yet released.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    fn sample_picture(&self, picture: PictureId, x0: i32, y0: i32, w: i32, h: i32) -> Option<Vec<Px>> {
        let p = self.pictures.get(&picture.0)?;
        let surface = self.pixmaps.get(&p.pixmap.0)?;
        let view = surface.view(p.format, p.repeat);
        let mut out = Vec::with_capacity((w * h) as usize);
        for j in 0..h {
            for i in 0..w {
                let (x, y) = (x0 + i, y0 + j);
                out.push(match &p.filter {
                    Some(kernel) => view.sample_convolved(x, y, kernel),
                    None => view.sample(x, y),
                });
            }
        }
        Some(out)
    }

    fn write_picture(
        &mut self,
        picture: PictureId,
        area: Rect,
        mut shade: impl FnMut(usize, Px) -> Px,
    ) {
        let Some(p) = self.pictures.get(&picture.0) else {
            tracing::warn!(?picture, "write to unknown picture");
            return;
        };
        let (format, clip) = (p.format, p.clip.as_ref());
        let Some(surface) = self.pixmaps.get_mut(&p.pixmap.0) else {
            tracing::warn!(?picture, "picture pixmap is gone");
            return;
        };
        for j in 0..area.height {
            for i in 0..area.width {
                let (x, y) = (area.x + i, area.y + j);
                if !surface.in_bounds(x, y) || clip.is_some_and(|c| !c.contains_point(x, y)) {
                    continue;
                }
                let d = surface.read(x, y, format);
                let out = shade((j * area.width + i) as usize, d);
                surface.write(x, y, format, out);
            }
        }
    }

    fn gl_blend(&mut self, area: Rect, region: Option<&Region>, mut shade: impl FnMut(i32, i32) -> Px) {
        let (sw, sh) = (self.width, self.height);
        let Some(gl) = self.gl.as_mut() else {
            tracing::warn!("accelerated draw without a context");
            return;
        };
        for j in 0..area.height {
            for i in 0..area.width {
                let (x, y) = (area.x + i, area.y + j);
                if x < 0 || y < 0 || x >= sw || y >= sh {
                    continue;
                }
                if gl.clip.as_ref().is_some_and(|c| !c.contains_point(x, y))
                    || region.is_some_and(|r| !r.contains_point(x, y))
                {
                    continue;
                }
                let idx = ((y * sw + x) as usize) * 4;
                let d = [
                    gl.framebuffer[idx],
                    gl.framebuffer[idx + 1],
                    gl.framebuffer[idx + 2],
                    gl.framebuffer[idx + 3],
                ];
                let out = raster::over(d, shade(i, j));
                gl.framebuffer[idx..idx + 4].copy_from_slice(&out);
            }
        }
    }

    fn insert_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.alloc_id());
        self.textures.insert(id.0, texture);
        id
    }
}

impl DisplayServer for MemoryServer {
    fn root_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn root_depth(&self) -> u8 {
        24
    }

    fn root_picture(&self) -> PictureId {
        self.root_picture
    }

    fn create_pixmap(&mut self, depth: u8, width: i32, height: i32) -> WincompResult<PixmapId> {
        if self.faults.pixmap_sizes.contains(&(width, height))
            || self.faults.pixmap_depths.contains(&depth)
        {
            return Err(WincompError::resource(format!(
                "cannot allocate {width}x{height} pixmap of depth {depth}"
            )));
        }
        let surface = Surface::new(width, height, depth)?;
        let pixmap = PixmapId(self.alloc_id());
        self.pixmaps.insert(pixmap.0, surface);
        self.calls.push(ServerCall::CreatePixmap {
            pixmap,
            depth,
            width,
            height,
        });
        Ok(pixmap)
    }

    fn free_pixmap(&mut self, pixmap: PixmapId) {
        self.calls.push(ServerCall::FreePixmap(pixmap));
        if !self.external.contains(&pixmap.0) {
            self.pixmaps.remove(&pixmap.0);
        }
    }

    fn validate_pixmap(&mut self, pixmap: PixmapId) -> bool {
        self.pixmaps.contains_key(&pixmap.0)
    }

    fn pixmap_geometry(&self, pixmap: PixmapId) -> Option<(i32, i32, u8)> {
        self.pixmaps
            .get(&pixmap.0)
            .map(|s| (s.w(), s.h(), s.depth))
    }

    fn name_window_pixmap(&mut self, window: WindowId) -> WincompResult<PixmapId> {
        if self.faults.name_window_pixmap {
            return Err(WincompError::resource(format!(
                "window {window:?} has no pixmap"
            )));
        }
        let contents = self
            .windows
            .get(&window)
            .ok_or_else(|| WincompError::resource(format!("unknown window {window:?}")))?;
        let mut surface = Surface::new(contents.width, contents.height, contents.depth)?;
        surface
            .pixmap
            .data_as_u8_slice_mut()
            .copy_from_slice(&contents.data);
        let pixmap = PixmapId(self.alloc_id());
        self.pixmaps.insert(pixmap.0, surface);
        self.calls
            .push(ServerCall::NameWindowPixmap { window, pixmap });
        Ok(pixmap)
    }

    fn root_background_pixmap(&mut self) -> Option<PixmapId> {
        self.root_background
    }

    fn put_image_a8(
        &mut self,
        pixmap: PixmapId,
        width: i32,
        height: i32,
        data: &[u8],
    ) -> WincompResult<()> {
        self.calls.push(ServerCall::PutImage {
            pixmap,
            width,
            height,
        });
        if width < 0 || height < 0 || data.len() < (width * height) as usize {
            return Err(WincompError::validation("image data too short"));
        }
        let surface = self
            .pixmaps
            .get_mut(&pixmap.0)
            .ok_or_else(|| WincompError::resource(format!("unknown pixmap {pixmap:?}")))?;
        if surface.depth != 8 {
            return Err(WincompError::validation("put_image_a8 needs a depth-8 pixmap"));
        }
        for y in 0..height.min(surface.h()) {
            for x in 0..width.min(surface.w()) {
                let a = data[(y * width + x) as usize];
                surface.write(x, y, PictFormat::A8, [0, 0, 0, a]);
            }
        }
        Ok(())
    }

    fn create_picture(
        &mut self,
        pixmap: PixmapId,
        format: PictFormat,
        repeat: bool,
    ) -> WincompResult<PictureId> {
        if self.faults.picture_formats.contains(&format) {
            return Err(WincompError::resource(format!(
                "cannot create {format:?} picture"
            )));
        }
        if !self.pixmaps.contains_key(&pixmap.0) {
            return Err(WincompError::resource(format!("unknown pixmap {pixmap:?}")));
        }
        let picture = PictureId(self.alloc_id());
        self.pictures.insert(
            picture.0,
            Picture {
                pixmap,
                format,
                repeat,
                filter: None,
                clip: None,
            },
        );
        self.calls.push(ServerCall::CreatePicture {
            picture,
            pixmap,
            format,
        });
        Ok(picture)
    }

    fn free_picture(&mut self, picture: PictureId) {
        self.calls.push(ServerCall::FreePicture(picture));
        if picture != self.root_picture {
            self.pictures.remove(&picture.0);
        }
    }

    fn composite(&mut self, args: &CompositeArgs) {
        self.calls.push(ServerCall::Composite(*args));
        if args.width <= 0 || args.height <= 0 {
            return;
        }
        let Some(src) =
            self.sample_picture(args.src, args.src_x, args.src_y, args.width, args.height)
        else {
            tracing::warn!(src = ?args.src, "composite from unknown picture");
            return;
        };
        let mask = match args.mask {
            Some(m) => match self.sample_picture(m, args.mask_x, args.mask_y, args.width, args.height) {
                Some(values) => Some(values),
                None => {
                    tracing::warn!(mask = ?m, "composite through unknown mask");
                    return;
                }
            },
            None => None,
        };
        let op = args.op;
        self.write_picture(args.dst, args.dst_rect(), |i, d| {
            let m = mask.as_ref().map_or(255, |m| m[i][3]);
            raster::blend(op, d, src[i], m)
        });
    }

    fn fill_rectangles(&mut self, op: PictOp, dst: PictureId, color: Color, rects: &[Rect]) {
        self.calls.push(ServerCall::FillRectangles {
            op,
            dst,
            color,
            rects: rects.to_vec(),
        });
        let px = color.to_premul_rgba8().to_array();
        for r in rects {
            self.write_picture(dst, *r, |_, d| raster::blend(op, d, px, 255));
        }
    }

    fn set_picture_filter(&mut self, picture: PictureId, filter: Filter<'_>) {
        self.calls.push(ServerCall::SetFilter {
            picture,
            convolution: matches!(filter, Filter::Convolution(_)),
        });
        if let Some(p) = self.pictures.get_mut(&picture.0) {
            p.filter = match filter {
                Filter::Nearest => None,
                Filter::Convolution(kernel) => Some(kernel.to_vec()),
            };
        }
    }

    fn set_picture_clip_region(
        &mut self,
        picture: PictureId,
        x_origin: i32,
        y_origin: i32,
        region: &Region,
    ) {
        let region = region.clone().translated(x_origin, y_origin);
        self.calls.push(ServerCall::SetClip {
            picture,
            region: region.clone(),
        });
        if let Some(p) = self.pictures.get_mut(&picture.0) {
            p.clip = Some(region);
        }
    }

    fn query_filter(&mut self, name: &str) -> bool {
        self.filters.iter().any(|f| f == name)
    }

    fn gl_init(&mut self) -> WincompResult<()> {
        if self.faults.gl_unavailable {
            return Err(WincompError::unsupported("no accelerated rendering context"));
        }
        self.gl = Some(GlContext {
            framebuffer: vec![0; (self.width * self.height * 4) as usize],
            clip: None,
        });
        Ok(())
    }

    fn bind_texture(
        &mut self,
        pixmap: PixmapId,
        width: i32,
        height: i32,
        depth: u8,
    ) -> WincompResult<TextureId> {
        if self.faults.texture_bind || self.gl.is_none() {
            return Err(WincompError::resource(format!(
                "cannot bind pixmap {pixmap:?} to a texture"
            )));
        }
        let surface = self
            .pixmaps
            .get(&pixmap.0)
            .ok_or_else(|| WincompError::resource(format!("unknown pixmap {pixmap:?}")))?;
        let width = if width > 0 { width } else { surface.w() };
        let height = if height > 0 { height } else { surface.h() };
        let depth = if depth > 0 { depth } else { surface.depth };
        let view = surface.view(PictFormat::for_depth(depth), false);
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&view.sample(x, y));
            }
        }
        let texture = self.insert_texture(Texture {
            width,
            height,
            data,
        });
        self.calls.push(ServerCall::BindTexture { texture, pixmap });
        Ok(texture)
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.calls.push(ServerCall::ReleaseTexture(texture));
        self.textures.remove(&texture.0);
    }

    fn gl_set_clip(&mut self, region: &Region) {
        self.calls.push(ServerCall::GlSetClip(region.clone()));
        if let Some(gl) = self.gl.as_mut() {
            gl.clip = Some(region.clone());
        }
    }

    fn gl_draw_texture(&mut self, draw: &TextureDraw<'_>) {
        let dst = Rect::new(draw.dst_x, draw.dst_y, draw.width, draw.height);
        self.calls.push(ServerCall::GlDraw {
            texture: draw.texture,
            dst,
            z: draw.z,
            opacity: draw.opacity,
            invert: draw.invert,
            region: draw.region.cloned(),
        });
        let Some(tex) = self.textures.remove(&draw.texture.0) else {
            tracing::warn!(texture = ?draw.texture, "draw with unknown texture");
            return;
        };
        let view = tex.view(true);
        let alpha = opacity_to_u8(draw.opacity);
        self.gl_blend(dst, draw.region, |i, j| {
            let mut px = view.sample(draw.src_x + i, draw.src_y + j);
            if !draw.argb {
                px[3] = 255;
            }
            if draw.invert {
                px = raster::invert(px);
            }
            raster::scale(px, alpha)
        });
        self.textures.insert(draw.texture.0, tex);
    }

    fn gl_dim(&mut self, rect: Rect, z: f32, opacity: f64, region: Option<&Region>) {
        self.calls.push(ServerCall::GlDim { rect, z, opacity });
        let px = [0, 0, 0, opacity_to_u8(opacity)];
        self.gl_blend(rect, region, |_, _| px);
    }

    fn gl_copy_to_texture(&mut self, rect: Rect) -> WincompResult<TextureId> {
        if self.faults.gl_copy {
            return Err(WincompError::resource("cannot copy framebuffer to texture"));
        }
        let gl = self
            .gl
            .as_ref()
            .ok_or_else(|| WincompError::unsupported("no accelerated rendering context"))?;
        if rect.is_empty() {
            return Err(WincompError::validation("empty framebuffer copy"));
        }
        let fb = PixelView {
            data: &gl.framebuffer,
            width: self.width,
            height: self.height,
            opaque: false,
            alpha_only: false,
            repeat: false,
        };
        let mut data = Vec::with_capacity((rect.width * rect.height * 4) as usize);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                data.extend_from_slice(&fb.sample(x, y));
            }
        }
        let texture = self.insert_texture(Texture {
            width: rect.width,
            height: rect.height,
            data,
        });
        self.calls.push(ServerCall::GlCopyToTexture { texture, rect });
        Ok(texture)
    }

    fn gl_convolve_texture(&mut self, texture: TextureId, kernel: &[Fixed]) -> WincompResult<()> {
        self.calls.push(ServerCall::GlConvolve(texture));
        let tex = self
            .textures
            .get_mut(&texture.0)
            .ok_or_else(|| WincompError::resource(format!("unknown texture {texture:?}")))?;
        let view = tex.view(false);
        let mut data = Vec::with_capacity(tex.data.len());
        for y in 0..tex.height {
            for x in 0..tex.width {
                data.extend_from_slice(&view.sample_convolved(x, y, kernel));
            }
        }
        tex.data = data;
        Ok(())
    }

    fn gl_wait(&mut self, finish: bool) {
        self.calls.push(ServerCall::GlWait { finish });
    }

    fn gl_swap_buffers(&mut self) {
        self.calls.push(ServerCall::SwapBuffers);
        let Some(gl) = self.gl.as_ref() else {
            return;
        };
        if let Some(screen) = self.pixmaps.get_mut(&self.screen.0) {
            screen
                .pixmap
                .data_as_u8_slice_mut()
                .copy_from_slice(&gl.framebuffer);
        }
    }

    fn init_vsync(&mut self) -> bool {
        !self.faults.vsync_unavailable
    }

    fn wait_vblank(&mut self) -> WincompResult<()> {
        self.calls.push(ServerCall::WaitVblank);
        if self.faults.vblank {
            return Err(WincompError::resource("vblank wait failed"));
        }
        Ok(())
    }

    fn fence_sync(&mut self) -> bool {
        self.calls.push(ServerCall::FenceSync);
        !self.faults.fence
    }

    fn sync(&mut self) {
        self.calls.push(ServerCall::Sync);
    }

    fn flush(&mut self) {
        self.calls.push(ServerCall::Flush);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/memory.rs"]
mod tests;
