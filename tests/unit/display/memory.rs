use super::*;

fn solid(server: &mut MemoryServer, w: i32, h: i32, depth: u8, px: [u8; 4]) -> PictureId {
    let pixmap = server.create_pixmap(depth, w, h).expect("pixmap");
    let pict = server
        .create_picture(pixmap, PictFormat::for_depth(depth), false)
        .expect("picture");
    server.fill_rectangles(
        PictOp::Src,
        pict,
        Color::rgba(
            f64::from(px[0]) / 255.0,
            f64::from(px[1]) / 255.0,
            f64::from(px[2]) / 255.0,
            f64::from(px[3]) / 255.0,
        ),
        &[Rect::new(0, 0, w, h)],
    );
    pict
}

#[test]
fn composite_src_copies_into_root() {
    let mut s = MemoryServer::new(4, 4);
    let src = solid(&mut s, 2, 2, 32, [255, 0, 0, 255]);
    let root = s.root_picture();
    let mut args = CompositeArgs::copy(PictOp::Src, src, root, 2, 2);
    args.dst_x = 1;
    args.dst_y = 1;
    s.composite(&args);
    let screen = s.screen_rgba();
    let px = |x: usize, y: usize| &screen[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(px(1, 1), &[255, 0, 0, 255]);
    assert_eq!(px(2, 2), &[255, 0, 0, 255]);
    assert_eq!(px(0, 0), &[0, 0, 0, 255]);
    assert_eq!(px(3, 3), &[0, 0, 0, 255]);
}

#[test]
fn destination_clip_limits_writes() {
    let mut s = MemoryServer::new(4, 1);
    let src = solid(&mut s, 4, 1, 32, [0, 255, 0, 255]);
    let root = s.root_picture();
    s.set_picture_clip_region(root, 1, 0, &Region::from_rect(Rect::new(0, 0, 2, 1)));
    s.composite(&CompositeArgs::copy(PictOp::Src, src, root, 4, 1));
    let screen = s.screen_rgba();
    assert_eq!(&screen[0..4], &[0, 0, 0, 255]);
    assert_eq!(&screen[4..8], &[0, 255, 0, 255]);
    assert_eq!(&screen[8..12], &[0, 255, 0, 255]);
    assert_eq!(&screen[12..16], &[0, 0, 0, 255]);
}

#[test]
fn mask_alpha_scales_over() {
    let mut s = MemoryServer::new(1, 1);
    let src = solid(&mut s, 1, 1, 32, [255, 255, 255, 255]);
    let mask_pixmap = s.create_pixmap(8, 1, 1).expect("mask");
    s.put_image_a8(mask_pixmap, 1, 1, &[128]).expect("put");
    let mask = s
        .create_picture(mask_pixmap, PictFormat::A8, true)
        .expect("mask picture");
    let mut args = CompositeArgs::copy(PictOp::Over, src, s.root_picture(), 1, 1);
    args.mask = Some(mask);
    s.composite(&args);
    assert_eq!(&s.screen_rgba()[0..3], &[128, 128, 128]);
}

#[test]
fn failure_injection_and_resource_counts() {
    let mut s = MemoryServer::new(8, 8);
    s.faults_mut().pixmap_sizes.push((8, 8));
    assert!(s.create_pixmap(24, 8, 8).is_err());
    assert!(s.create_pixmap(24, 0, 8).is_err());
    let p = s.create_pixmap(24, 4, 4).expect("pixmap");
    assert_eq!(s.live_pixmaps(), 1);
    s.free_pixmap(p);
    s.free_pixmap(p);
    assert_eq!(s.live_pixmaps(), 0);
    assert!(!s.validate_pixmap(p));
}

#[test]
fn named_window_pixmap_carries_contents() {
    let mut s = MemoryServer::new(8, 8);
    let id = WindowId(7);
    s.fill_window(id, 2, 3, 24, Rgba8Premul::new(1, 2, 3, 255))
        .expect("window");
    let pixmap = s.name_window_pixmap(id).expect("named");
    assert_eq!(s.pixmap_geometry(pixmap), Some((2, 3, 24)));
    assert_eq!(&s.pixmap_rgba(pixmap).expect("bytes")[0..4], &[1, 2, 3, 255]);
    assert!(s.name_window_pixmap(WindowId(99)).is_err());
    assert!(s.fill_window(WindowId(8), 0, 4, 24, Rgba8Premul::new(0, 0, 0, 255)).is_err());
    assert!(s.fill_window(WindowId(8), 4, -1, 24, Rgba8Premul::new(0, 0, 0, 255)).is_err());
}

#[test]
fn gl_draw_and_swap_reach_the_screen() {
    let mut s = MemoryServer::new(2, 2);
    s.gl_init().expect("gl");
    s.fill_window(WindowId(1), 2, 2, 24, Rgba8Premul::new(9, 8, 7, 255))
        .expect("window");
    let pixmap = s.name_window_pixmap(WindowId(1)).expect("pixmap");
    let tex = s.bind_texture(pixmap, 0, 0, 0).expect("texture");
    s.gl_draw_texture(&TextureDraw {
        texture: tex,
        src_x: 0,
        src_y: 0,
        dst_x: 0,
        dst_y: 0,
        width: 2,
        height: 2,
        z: 1.0,
        opacity: 1.0,
        argb: false,
        invert: false,
        region: None,
    });
    s.gl_swap_buffers();
    assert_eq!(&s.screen_rgba()[0..4], &[9, 8, 7, 255]);
    assert!(s.calls().contains(&ServerCall::SwapBuffers));
}

#[test]
fn filters_are_queryable() {
    let mut s = MemoryServer::new(1, 1);
    assert!(s.query_filter(crate::display::CONVOLUTION_FILTER));
    s.set_supported_filters(&["nearest"]);
    assert!(!s.query_filter(crate::display::CONVOLUTION_FILTER));
}
