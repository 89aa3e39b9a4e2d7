use smallvec::SmallVec;

use crate::display::{DisplayServer, PictFormat, PictureId, PixmapId, TextureId, WindowId};
use crate::foundation::error::{WincompError, WincompResult};

/// Where a binding's backing pixmap comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSource {
    /// The offscreen pixmap of a redirected window, named from the server.
    Window(WindowId),
    /// A freshly allocated pixmap (frame target, intermediates).
    Offscreen {
        /// 24 for opaque targets, 32 when alpha must survive.
        depth: u8,
        /// Pixel size of the allocation.
        width: i32,
        /// See `width`.
        height: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BoundTexture {
    id: TextureId,
    pixmap: PixmapId,
}

/// Cached rendering handles of one surface: pixmap, picture derived from it, and a texture
/// bound from it.
///
/// Every handle is created lazily and released by [`SurfaceBinding::free`], which may be called
/// any number of times.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceBinding {
    pixmap: Option<PixmapId>,
    picture: Option<PictureId>,
    texture: Option<BoundTexture>,
    width: i32,
    height: i32,
}

impl SurfaceBinding {
    /// An empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding that already owns a pixmap and a picture built from it.
    pub fn from_parts(pixmap: PixmapId, picture: PictureId, width: i32, height: i32) -> Self {
        Self {
            pixmap: Some(pixmap),
            picture: Some(picture),
            texture: None,
            width,
            height,
        }
    }

    /// Backing pixmap.
    pub fn pixmap(&self) -> Option<PixmapId> {
        self.pixmap
    }

    /// Picture derived from the pixmap.
    pub fn picture(&self) -> Option<PictureId> {
        self.picture
    }

    /// Bound texture.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture.map(|t| t.id)
    }

    /// Recorded surface width (0 when unknown).
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Recorded surface height (0 when unknown).
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Return `true` when no handle is held.
    pub fn is_empty(&self) -> bool {
        self.pixmap.is_none() && self.picture.is_none() && self.texture.is_none()
    }

    /// Make sure a backing pixmap exists; a no-op when one is already held.
    pub fn ensure_buffer(
        &mut self,
        server: &mut dyn DisplayServer,
        source: BufferSource,
    ) -> WincompResult<PixmapId> {
        if let Some(pixmap) = self.pixmap {
            return Ok(pixmap);
        }
        let pixmap = match source {
            BufferSource::Window(window) => server.name_window_pixmap(window)?,
            BufferSource::Offscreen {
                depth,
                width,
                height,
            } => server.create_pixmap(depth, width, height)?,
        };
        if let Some((w, h, _)) = server.pixmap_geometry(pixmap) {
            self.width = w;
            self.height = h;
        }
        self.pixmap = Some(pixmap);
        Ok(pixmap)
    }

    /// Make sure a picture over the pixmap exists.
    pub fn ensure_target(
        &mut self,
        server: &mut dyn DisplayServer,
        format: PictFormat,
    ) -> WincompResult<PictureId> {
        if let Some(picture) = self.picture {
            return Ok(picture);
        }
        let pixmap = self
            .pixmap
            .ok_or_else(|| WincompError::resource("no pixmap to derive a picture from"))?;
        let picture = server.create_picture(pixmap, format, false)?;
        self.picture = Some(picture);
        Ok(picture)
    }

    /// Bind the pixmap as a texture.
    ///
    /// Skipped when a texture from the current pixmap is already bound, unless `force`. Failures
    /// are logged and reported as `false`.
    pub fn bind_texture(
        &mut self,
        server: &mut dyn DisplayServer,
        width: i32,
        height: i32,
        depth: u8,
        force: bool,
    ) -> bool {
        let Some(pixmap) = self.pixmap else {
            return false;
        };
        if !force && self.texture.is_some_and(|t| t.pixmap == pixmap) {
            return true;
        }
        if let Some(old) = self.texture.take() {
            server.release_texture(old.id);
        }
        match server.bind_texture(pixmap, width, height, depth) {
            Ok(id) => {
                self.texture = Some(BoundTexture { id, pixmap });
                true
            }
            Err(err) => {
                tracing::error!(?pixmap, %err, "failed to bind texture");
                false
            }
        }
    }

    /// Whether the surface can be painted: a picture for target-composited backends, a bound
    /// texture for texture-accelerated ones.
    pub fn is_valid(&self, uses_pictures: bool) -> bool {
        if uses_pictures {
            self.picture.is_some()
        } else {
            self.texture.is_some()
        }
    }

    /// Release the texture only.
    pub fn release_texture(&mut self, server: &mut dyn DisplayServer) {
        if let Some(t) = self.texture.take() {
            server.release_texture(t.id);
        }
    }

    /// Release texture and picture, and forget a pixmap owned by another client without
    /// freeing it.
    pub fn detach(&mut self, server: &mut dyn DisplayServer) {
        self.release_texture(server);
        if let Some(picture) = self.picture.take() {
            server.free_picture(picture);
        }
        self.pixmap = None;
        self.width = 0;
        self.height = 0;
    }

    /// Release texture, picture and pixmap. Calling it on an empty binding does nothing.
    pub fn free(&mut self, server: &mut dyn DisplayServer) {
        self.release_texture(server);
        if let Some(picture) = self.picture.take() {
            server.free_picture(picture);
        }
        if let Some(pixmap) = self.pixmap.take() {
            server.free_pixmap(pixmap);
        }
        self.width = 0;
        self.height = 0;
    }
}

/// Scoped owner of handles created during a multi-step build.
///
/// Everything created through the guard is released when it goes out of scope, except the
/// handles passed to [`ResourceGuard::keep_pixmap`] / [`ResourceGuard::keep_picture`].
pub struct ResourceGuard<'s, S: DisplayServer + ?Sized> {
    server: &'s mut S,
    pixmaps: SmallVec<[PixmapId; 4]>,
    pictures: SmallVec<[PictureId; 4]>,
}

impl<'s, S: DisplayServer + ?Sized> ResourceGuard<'s, S> {
    /// Start tracking handles created on `server`.
    pub fn new(server: &'s mut S) -> Self {
        Self {
            server,
            pixmaps: SmallVec::new(),
            pictures: SmallVec::new(),
        }
    }

    /// The guarded server, for requests that create nothing.
    pub fn server(&mut self) -> &mut S {
        self.server
    }

    /// Create a tracked pixmap.
    pub fn create_pixmap(&mut self, depth: u8, width: i32, height: i32) -> WincompResult<PixmapId> {
        let pixmap = self.server.create_pixmap(depth, width, height)?;
        self.pixmaps.push(pixmap);
        Ok(pixmap)
    }

    /// Create a tracked picture.
    pub fn create_picture(
        &mut self,
        pixmap: PixmapId,
        format: PictFormat,
        repeat: bool,
    ) -> WincompResult<PictureId> {
        let picture = self.server.create_picture(pixmap, format, repeat)?;
        self.pictures.push(picture);
        Ok(picture)
    }

    /// Stop tracking a pixmap so it survives the guard.
    pub fn keep_pixmap(&mut self, pixmap: PixmapId) {
        self.pixmaps.retain(|p| *p != pixmap);
    }

    /// Stop tracking a picture so it survives the guard.
    pub fn keep_picture(&mut self, picture: PictureId) {
        self.pictures.retain(|p| *p != picture);
    }
}

impl<S: DisplayServer + ?Sized> Drop for ResourceGuard<'_, S> {
    fn drop(&mut self) {
        for picture in self.pictures.drain(..).rev() {
            self.server.free_picture(picture);
        }
        for pixmap in self.pixmaps.drain(..).rev() {
            self.server.free_pixmap(pixmap);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/binding.rs"]
mod tests;
