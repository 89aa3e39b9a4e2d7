use super::*;
use crate::display::memory::{MemoryServer, ServerCall};
use crate::display::{PictFormat, PictOp};
use crate::foundation::core::Color;
use crate::render::binding::BufferSource;

#[test]
fn failed_context_releases_composition_resources() {
    let mut server = MemoryServer::new(4, 4);
    server.faults_mut().gl_unavailable = true;
    let mut backend = HybridBackend::new();
    assert!(backend.init(&mut server, &CompositorOpts::default()).is_err());
    assert_eq!(server.live_pictures(), 0);
    assert_eq!(server.live_pixmaps(), 0);
}

#[test]
fn present_draws_the_composed_target_through_the_context() {
    let mut server = MemoryServer::new(4, 4);
    let mut backend = HybridBackend::new();
    backend
        .init(&mut server, &CompositorOpts::default())
        .expect("init");
    assert!(backend.uses_pictures());
    assert!(backend.has_gl_context());

    let mut target = SurfaceBinding::new();
    target
        .ensure_buffer(
            &mut server,
            BufferSource::Offscreen {
                depth: 24,
                width: 4,
                height: 4,
            },
        )
        .expect("pixmap");
    let picture = target
        .ensure_target(&mut server, PictFormat::Rgb24)
        .expect("picture");
    let damage = Region::from_rect(Rect::new(0, 0, 4, 4));
    backend
        .frame_start(&mut server, &target, &damage)
        .expect("frame");
    server.fill_rectangles(
        PictOp::Src,
        picture,
        Color::rgba(0.0, 1.0, 0.0, 1.0),
        &[Rect::new(0, 0, 4, 4)],
    );
    server.take_calls();

    backend.present(&mut server, &mut target, &damage, true, false);
    let calls = server.take_calls();
    assert_eq!(calls[0], ServerCall::Sync);
    assert_eq!(calls[1], ServerCall::GlWait { finish: true });
    assert!(matches!(calls[2], ServerCall::BindTexture { .. }));
    assert_eq!(calls[3], ServerCall::GlWait { finish: true });
    assert!(matches!(calls[4], ServerCall::GlDraw { z, opacity, .. } if z == 0.0 && opacity == 1.0));
    assert_eq!(calls[5], ServerCall::SwapBuffers);
    assert_eq!(&server.screen_rgba()[0..4], &[0, 255, 0, 255]);

    target.free(&mut server);
    backend.deinit(&mut server);
    assert_eq!(server.live_textures(), 0);
    assert_eq!(server.live_pictures(), 0);
}
