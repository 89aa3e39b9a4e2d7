use super::*;

fn window(rect: Rect) -> Window {
    Window::new(WindowId(1), rect)
}

#[test]
fn mode_follows_alpha_and_opacities() {
    let mut w = window(Rect::new(0, 0, 10, 10));
    assert_eq!(w.mode(), WindowMode::Solid);
    assert!(w.is_solid(false));
    assert!(!w.is_solid(true));

    w.frame_opacity = 0.5;
    assert_eq!(w.mode(), WindowMode::Solid, "no frame to be translucent");
    w.frame = Margins::new(2, 1, 1, 1);
    assert_eq!(w.mode(), WindowMode::FrameTrans);

    w.opacity = 0.9;
    assert_eq!(w.mode(), WindowMode::Trans);
    w.opacity = 1.0;
    w.has_alpha = true;
    assert_eq!(w.mode(), WindowMode::Trans);
    assert_eq!(w.pict_format(), PictFormat::Argb32);
}

#[test]
fn noframe_region_excludes_clamped_margins() {
    let mut w = window(Rect::new(5, 5, 20, 10));
    w.frame = Margins::new(3, -4, 2, 1);
    assert_eq!(
        w.region_noframe_local(),
        Region::from_rect(Rect::new(0, 3, 19, 5))
    );
    w.frame = Margins::new(6, 0, 6, 0);
    assert!(w.region_noframe_local().is_empty());
}

#[test]
fn opaque_region_drops_translucent_frame() {
    let mut w = window(Rect::new(10, 20, 8, 8));
    assert_eq!(w.opaque_region(), Region::from_rect(Rect::new(10, 20, 8, 8)));
    w.frame = Margins::new(2, 2, 2, 2);
    w.frame_opacity = 0.5;
    assert_eq!(w.opaque_region(), Region::from_rect(Rect::new(12, 22, 4, 4)));
}

#[test]
fn reg_ignore_accumulates_solid_windows_above() {
    let mut stack = vec![
        window(Rect::new(0, 0, 10, 10)),
        window(Rect::new(5, 0, 10, 10)),
        window(Rect::new(0, 5, 4, 4)),
    ];
    stack[1].opacity = 0.5;
    update_reg_ignore(&mut stack, false);
    assert!(stack[2].reg_ignore.is_empty());
    assert_eq!(stack[1].reg_ignore, Region::from_rect(Rect::new(0, 5, 4, 4)));
    assert_eq!(stack[0].reg_ignore, Region::from_rect(Rect::new(0, 5, 4, 4)));

    update_reg_ignore(&mut stack, true);
    assert!(stack[0].reg_ignore.is_empty());
}

#[test]
fn shadow_follows_options_and_opacities() {
    let mut w = window(Rect::new(0, 0, 30, 20));
    w.opacity = 0.5;
    let opts = ShadowOpts::default();
    w.update_shadow(&opts);
    assert_eq!(w.shadow_geometry.width, 30 + 24);
    assert_eq!(w.shadow_geometry.dx, -15);
    assert_eq!(w.shadow_opacity, 0.75 * 0.5);
}

#[test]
fn closures_observe_fades() {
    let mut seen = Vec::new();
    let mut observer = |w: &mut Window| seen.push(w.id);
    let mut w = window(Rect::new(0, 0, 1, 1));
    observer.fade_check(&mut w);
    NoFade.fade_check(&mut w);
    assert_eq!(seen, vec![WindowId(1)]);
}
