use super::*;
use crate::display::memory::{MemoryServer, ServerCall};
use crate::foundation::core::Rgba8Premul;

fn server_with_window() -> (MemoryServer, WindowId) {
    let mut server = MemoryServer::new(16, 16);
    let id = WindowId(1);
    server
        .fill_window(id, 4, 4, 32, Rgba8Premul::new(10, 10, 10, 255))
        .expect("window");
    (server, id)
}

#[test]
fn free_is_idempotent() {
    let (mut server, id) = server_with_window();
    server.gl_init().expect("gl");
    let mut binding = SurfaceBinding::new();
    binding
        .ensure_buffer(&mut server, BufferSource::Window(id))
        .expect("pixmap");
    binding
        .ensure_target(&mut server, PictFormat::Argb32)
        .expect("picture");
    assert!(binding.bind_texture(&mut server, 0, 0, 0, false));
    assert_eq!((binding.width(), binding.height()), (4, 4));

    binding.free(&mut server);
    let once = binding.clone();
    let live = (server.live_pixmaps(), server.live_pictures(), server.live_textures());
    binding.free(&mut server);

    assert_eq!(binding, once);
    assert!(binding.is_empty());
    assert_eq!(live, (0, 0, 0));
    assert_eq!(
        (server.live_pixmaps(), server.live_pictures(), server.live_textures()),
        live
    );
}

#[test]
fn ensure_buffer_and_target_reuse_handles() {
    let (mut server, id) = server_with_window();
    let mut binding = SurfaceBinding::new();
    let a = binding
        .ensure_buffer(&mut server, BufferSource::Window(id))
        .expect("pixmap");
    let b = binding
        .ensure_buffer(&mut server, BufferSource::Window(id))
        .expect("pixmap");
    assert_eq!(a, b);
    let p = binding
        .ensure_target(&mut server, PictFormat::Argb32)
        .expect("picture");
    assert_eq!(
        binding.ensure_target(&mut server, PictFormat::Argb32).ok(),
        Some(p)
    );
    assert!(binding.is_valid(true));
    assert!(!binding.is_valid(false));
}

#[test]
fn texture_rebinds_only_when_forced() {
    let (mut server, id) = server_with_window();
    server.gl_init().expect("gl");
    let mut binding = SurfaceBinding::new();
    assert!(!binding.bind_texture(&mut server, 0, 0, 0, false));
    binding
        .ensure_buffer(&mut server, BufferSource::Window(id))
        .expect("pixmap");
    assert!(binding.bind_texture(&mut server, 0, 0, 0, false));
    let first = binding.texture();
    assert!(binding.bind_texture(&mut server, 0, 0, 0, false));
    assert_eq!(binding.texture(), first);
    assert!(binding.bind_texture(&mut server, 0, 0, 0, true));
    assert_ne!(binding.texture(), first);
    assert_eq!(server.live_textures(), 1);
}

#[test]
fn failed_bind_reports_false() {
    let (mut server, id) = server_with_window();
    server.gl_init().expect("gl");
    server.faults_mut().texture_bind = true;
    let mut binding = SurfaceBinding::new();
    binding
        .ensure_buffer(&mut server, BufferSource::Window(id))
        .expect("pixmap");
    assert!(!binding.bind_texture(&mut server, 0, 0, 0, true));
    assert!(!binding.is_valid(false));
}

#[test]
fn guard_releases_everything_not_kept() {
    let mut server = MemoryServer::new(8, 8);
    let kept = {
        let mut guard = ResourceGuard::new(&mut server);
        let a = guard.create_pixmap(8, 2, 2).expect("a");
        let b = guard.create_pixmap(32, 2, 2).expect("b");
        guard.create_picture(a, PictFormat::A8, false).expect("pa");
        let pb = guard.create_picture(b, PictFormat::Argb32, false).expect("pb");
        guard.keep_pixmap(b);
        guard.keep_picture(pb);
        (b, pb)
    };
    assert_eq!(server.live_pixmaps(), 1);
    assert_eq!(server.live_pictures(), 1);
    assert!(server.validate_pixmap(kept.0));

    {
        let mut guard = ResourceGuard::new(&mut server);
        guard.create_pixmap(8, 2, 2).expect("c");
        server_fault(guard.server());
        assert!(guard.create_pixmap(32, 2, 2).is_err());
    }
    assert_eq!(server.live_pixmaps(), 1);
}

fn server_fault(server: &mut MemoryServer) {
    server.faults_mut().pixmap_depths.push(32);
}

#[test]
fn detach_keeps_foreign_pixmaps_alive() {
    let mut server = MemoryServer::new(4, 4);
    let background = server
        .set_root_background(2, 2, &[7; 16])
        .expect("background");
    let picture = server
        .create_picture(background, PictFormat::Rgb24, true)
        .expect("picture");
    let mut binding = SurfaceBinding::from_parts(background, picture, 2, 2);
    binding.detach(&mut server);
    binding.detach(&mut server);
    assert!(binding.is_empty());
    assert!(server.validate_pixmap(background));
    assert_eq!(server.live_pictures(), 0);
    assert!(!server.calls().contains(&ServerCall::FreePixmap(background)));
}
