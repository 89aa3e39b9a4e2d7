use super::*;
use crate::display::WindowId;
use crate::display::memory::{MemoryServer, ServerCall};
use crate::foundation::core::Rgba8Premul;

struct Fixture {
    server: MemoryServer,
    backend: XRenderBackend,
    target: SurfaceBinding,
    window: SurfaceBinding,
    full: Region,
}

fn fixture() -> Fixture {
    let mut server = MemoryServer::new(8, 8);
    let mut backend = XRenderBackend::new();
    backend
        .init(&mut server, &CompositorOpts::default())
        .expect("init");
    let mut target = SurfaceBinding::new();
    target
        .ensure_buffer(
            &mut server,
            BufferSource::Offscreen {
                depth: 24,
                width: 8,
                height: 8,
            },
        )
        .expect("target pixmap");
    target
        .ensure_target(&mut server, PictFormat::Rgb24)
        .expect("target picture");
    server
        .fill_window(WindowId(1), 2, 2, 24, Rgba8Premul::new(255, 0, 0, 255))
        .expect("window");
    let mut window = SurfaceBinding::new();
    window
        .ensure_buffer(&mut server, BufferSource::Window(WindowId(1)))
        .expect("window pixmap");
    window
        .ensure_target(&mut server, PictFormat::Rgb24)
        .expect("window picture");
    let full = Region::from_rect(Rect::new(0, 0, 8, 8));
    backend
        .frame_start(&mut server, &target, &full)
        .expect("frame start");
    server.take_calls();
    Fixture {
        server,
        backend,
        target,
        window,
        full,
    }
}

fn composites(server: &mut MemoryServer) -> Vec<CompositeArgs> {
    server
        .take_calls()
        .into_iter()
        .filter_map(|c| match c {
            ServerCall::Composite(args) => Some(args),
            _ => None,
        })
        .collect()
}

fn request(region: &Region, opacity: f64, argb: bool) -> RenderRequest<'_> {
    RenderRequest {
        src_x: 0,
        src_y: 0,
        dst_x: 3,
        dst_y: 4,
        width: 2,
        height: 2,
        opacity,
        argb,
        region,
    }
}

#[test]
fn operator_and_mask_follow_opacity_and_alpha() {
    let mut f = fixture();
    let src = PaintSource::of(&f.window, false);

    f.backend
        .render(&mut f.server, &src, &request(&f.full, 0.001, false));
    assert!(composites(&mut f.server).is_empty());

    f.backend
        .render(&mut f.server, &src, &request(&f.full, 1.0, false));
    let calls = composites(&mut f.server);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].op, PictOp::Src);
    assert_eq!(calls[0].mask, None);
    assert_eq!((calls[0].dst_x, calls[0].dst_y), (3, 4));
    assert_eq!(calls[0].dst, f.target.picture().expect("target"));

    f.backend
        .render(&mut f.server, &src, &request(&f.full, 1.0, true));
    let calls = composites(&mut f.server);
    assert_eq!((calls[0].op, calls[0].mask), (PictOp::Over, None));

    f.backend
        .render(&mut f.server, &src, &request(&f.full, 0.5, false));
    let calls = composites(&mut f.server);
    assert_eq!(calls[0].op, PictOp::Over);
    assert!(calls[0].mask.is_some());
    assert_eq!((calls[0].mask_x, calls[0].mask_y), (0, 0));
}

#[test]
fn half_opacity_blends_into_target() {
    let mut f = fixture();
    let src = PaintSource::of(&f.window, false);
    f.backend
        .render(&mut f.server, &src, &request(&f.full, 0.5, false));
    let pixels = f
        .server
        .picture_rgba(f.target.picture().expect("target"))
        .expect("pixels");
    let idx = (4 * 8 + 3) * 4;
    assert_eq!(&pixels[idx..idx + 3], &[127, 0, 0]);
    assert_eq!(&pixels[0..3], &[0, 0, 0]);
}

#[test]
fn inverted_paint_uses_a_scratch_copy() {
    let mut f = fixture();
    let pictures = f.server.live_pictures();
    let source = f
        .backend
        .begin_paint(&mut f.server, &f.window, 2, 2, false, true);
    let scratch = source.scratch.as_ref().expect("scratch");
    assert_eq!(source.picture, scratch.picture());
    assert_ne!(source.picture, f.window.picture());
    assert!(!source.invert);
    let pixels = f
        .server
        .picture_rgba(source.picture.expect("picture"))
        .expect("pixels");
    assert_eq!(&pixels[0..4], &[0, 255, 255, 255]);
    assert_eq!(f.server.live_pictures(), pictures + 1);

    f.backend.end_paint(&mut f.server, source);
    assert_eq!(f.server.live_pictures(), pictures);
}

#[test]
fn inverted_paint_falls_back_to_the_original() {
    let mut f = fixture();
    f.server.faults_mut().pixmap_sizes.push((2, 2));
    let source = f
        .backend
        .begin_paint(&mut f.server, &f.window, 2, 2, false, true);
    assert!(source.scratch.is_none());
    assert_eq!(source.picture, f.window.picture());
}

#[test]
fn dim_fills_black_over_the_rect() {
    let mut f = fixture();
    f.backend
        .dim(&mut f.server, Rect::new(1, 1, 2, 2), 0.5, &f.full);
    let calls = f.server.take_calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        ServerCall::FillRectangles { op: PictOp::Over, rects, .. } if rects == &vec![Rect::new(1, 1, 2, 2)]
    )));
}

#[test]
fn frame_start_needs_a_target_picture() {
    let mut f = fixture();
    let err = f
        .backend
        .frame_start(&mut f.server, &SurfaceBinding::new(), &f.full)
        .expect_err("no picture");
    assert!(err.is_fatal());
}

#[test]
fn present_copies_target_to_root_and_clips_root_to_damage() {
    let mut f = fixture();
    let damage = Region::from_rect(Rect::new(0, 0, 4, 8));
    f.backend
        .frame_start(&mut f.server, &f.target, &damage)
        .expect("frame");
    let target = f.target.picture().expect("target");
    f.server
        .fill_rectangles(PictOp::Src, target, Color::WHITE, &[Rect::new(0, 0, 8, 8)]);
    f.backend
        .present(&mut f.server, &mut f.target, &damage, false, false);
    let calls = composites(&mut f.server);
    let last = calls.last().expect("present");
    assert_eq!(last.src, target);
    assert_eq!(last.dst, f.server.root_picture());
    let screen = f.server.screen_rgba();
    assert_eq!(&screen[0..3], &[255, 255, 255]);
    let right = 7 * 4;
    assert_eq!(&screen[right..right + 3], &[0, 0, 0]);
}

#[test]
fn deinit_releases_everything() {
    let mut f = fixture();
    f.backend.deinit(&mut f.server);
    f.backend.deinit(&mut f.server);
    f.target.free(&mut f.server);
    f.window.free(&mut f.server);
    assert_eq!(f.server.live_pictures(), 0);
    assert_eq!(f.server.live_pixmaps(), 0);
}
