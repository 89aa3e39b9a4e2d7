use super::*;
use crate::display::memory::{MemoryServer, ServerCall};
use crate::foundation::core::Rect;
use crate::render::binding::BufferSource;
use crate::render::xrender::XRenderBackend;

fn present_calls(vsync: VsyncMode) -> Vec<ServerCall> {
    let mut server = MemoryServer::new(4, 4);
    let opts = CompositorOpts {
        vsync,
        ..CompositorOpts::default()
    };
    let mut backend = XRenderBackend::new();
    backend.init(&mut server, &opts).expect("init");
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
    target
        .ensure_target(&mut server, crate::display::PictFormat::Rgb24)
        .expect("picture");
    let screen = Region::from_rect(Rect::new(0, 0, 4, 4));
    backend
        .frame_start(&mut server, &target, &screen)
        .expect("frame");
    let pacer = FramePacer::new(&mut server, &opts);
    server.take_calls();
    pacer.present(&mut server, &mut backend, &mut target, &screen, &screen);
    server
        .take_calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                ServerCall::WaitVblank
                    | ServerCall::Composite(_)
                    | ServerCall::Flush
                    | ServerCall::Sync
            )
        })
        .collect()
}

fn is_present(call: &ServerCall) -> bool {
    matches!(call, ServerCall::Composite(_))
}

#[test]
fn conservative_waits_before_present() {
    let calls = present_calls(VsyncMode::Conservative);
    assert_eq!(calls[0], ServerCall::Sync);
    assert_eq!(calls[1], ServerCall::WaitVblank);
    assert!(is_present(&calls[2]));
    assert_eq!(calls[3], ServerCall::Flush);
}

#[test]
fn aggressive_waits_after_present() {
    let calls = present_calls(VsyncMode::Aggressive);
    assert_eq!(calls[0], ServerCall::Sync);
    assert!(is_present(&calls[1]));
    assert_eq!(calls[2], ServerCall::WaitVblank);
    assert_eq!(calls[3], ServerCall::Flush);
}

#[test]
fn off_never_waits() {
    let calls = present_calls(VsyncMode::Off);
    assert!(is_present(&calls[0]));
    assert_eq!(calls[1], ServerCall::Flush);
    assert_eq!(calls.len(), 2);
}

#[test]
fn unusable_vsync_is_disabled() {
    let mut server = MemoryServer::new(4, 4);
    server.faults_mut().vsync_unavailable = true;
    let opts = CompositorOpts {
        vsync: VsyncMode::Aggressive,
        ..CompositorOpts::default()
    };
    assert_eq!(FramePacer::new(&mut server, &opts).vsync(), VsyncMode::Off);
}
