use super::*;

const BASIC: &str = r#"{
    "width": 8,
    "height": 8,
    "background": {"red": 0.0, "green": 0.0, "blue": 1.0, "alpha": 1.0},
    "windows": [
        {"id": 1, "rect": {"x": 0, "y": 0, "width": 4, "height": 4},
         "color": {"red": 1.0, "green": 0.0, "blue": 0.0, "alpha": 1.0}},
        {"id": 2, "rect": {"x": 2, "y": 2, "width": 4, "height": 4},
         "color": {"red": 0.0, "green": 1.0, "blue": 0.0, "alpha": 1.0},
         "shape": [{"x": 0, "y": 0, "width": 2, "height": 9}]}
    ]
}"#;

fn px(pixels: &[u8], x: usize, y: usize) -> &[u8] {
    let idx = (y * 8 + x) * 4;
    &pixels[idx..idx + 4]
}

#[test]
fn parses_with_defaults() {
    let scene = Scene::from_json(BASIC).expect("scene");
    assert_eq!(scene.windows.len(), 2);
    assert_eq!(scene.windows[0].opacity, 1.0);
    assert!(scene.damage_region().is_none());
    assert_eq!(scene.opts, CompositorOpts::default());
}

#[test]
fn rejects_bad_scenes() {
    let dup = BASIC.replace("\"id\": 2", "\"id\": 1");
    assert!(Scene::from_json(&dup).is_err());
    let zero = BASIC.replace("\"width\": 8", "\"width\": 0");
    assert!(Scene::from_json(&zero).is_err());
    let opaque = BASIC.replace(
        "\"color\": {\"red\": 1.0",
        "\"opacity\": 2.0, \"color\": {\"red\": 1.0",
    );
    assert!(Scene::from_json(&opaque).is_err());
    assert!(Scene::from_json("{").is_err());
}

#[test]
fn oversized_effect_options_are_validation_errors() {
    for opts in [
        r#""opts": {"blur": {"background": true, "kernel": "99999999999,99999999999,1"}},"#,
        r#""opts": {"shadow": {"radius": 40000}},"#,
    ] {
        let src = BASIC.replacen("\"width\": 8,", &format!("{opts} \"width\": 8,"), 1);
        let err = Scene::from_json(&src).expect_err("oversized option");
        assert!(matches!(err, WincompError::Validation(_)), "{err}");
    }
}

#[test]
fn windows_get_shapes_and_reg_ignore() {
    let scene = Scene::from_json(BASIC).expect("scene");
    let mut server = scene.build_server().expect("server");
    let mut compositor = Compositor::new(&mut server, scene.opts.clone()).expect("compositor");
    let windows = scene.build_windows(&compositor);
    assert_eq!(
        windows[1].bounding_shape,
        Region::from_rect(Rect::new(0, 0, 2, 4))
    );
    assert_eq!(
        windows[0].reg_ignore,
        Region::from_rect(Rect::new(2, 2, 2, 4))
    );
    assert_eq!(windows[0].shadow_geometry.width, 4 + 24);
    compositor.deinit(&mut server);
}

#[test]
fn renders_the_stack_over_the_background() {
    let scene = Scene::from_json(BASIC).expect("scene");
    let (pixels, stats) = scene.render().expect("render");
    assert_eq!(stats.windows_painted, 2);
    assert_eq!(px(&pixels, 0, 0), &[255, 0, 0, 255]);
    assert_eq!(px(&pixels, 3, 3), &[0, 255, 0, 255]);
    assert_eq!(px(&pixels, 2, 2), &[0, 255, 0, 255]);
    assert_eq!(px(&pixels, 3, 1), &[255, 0, 0, 255]);
    // Inside window 2's rectangle but outside its shape.
    assert_eq!(px(&pixels, 5, 3), &[0, 0, 255, 255]);
    assert_eq!(px(&pixels, 7, 7), &[0, 0, 255, 255]);
}
