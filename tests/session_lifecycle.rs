mod common;

use std::time::{Duration, Instant};

use common::{animated_asset, ManualLoader, MemorySource, RecordingRenderer};
use diorama::config::ViewerConfig;
use diorama::core::{FrameOutcome, ManualClock, ResizeSignal, Session, SessionPhase, SurfaceSize};
use diorama::loaders::{AssetPath, ThreadedLoader};
use diorama::DriverState;

const FRAME: f32 = 1.0 / 60.0;

fn start(config: &ViewerConfig) -> Session<RecordingRenderer, ManualLoader, ManualClock> {
    Session::start(
        config,
        RecordingRenderer::default(),
        ManualLoader::default(),
        &ResizeSignal::new(),
        ManualClock::fixed(FRAME),
        SurfaceSize::new(1280, 720),
    )
}

fn current_asset<L: diorama::loaders::AssetLoader>(
    session: &Session<RecordingRenderer, L, ManualClock>,
) -> Option<String> {
    session
        .scene()
        .dynamic_asset()
        .map(|n| n.handle().name().to_string())
}

#[test]
fn test_initial_load_is_requested_at_start() {
    let session = start(&ViewerConfig::default());

    assert_eq!(session.loader().requests.len(), 1);
    assert_eq!(session.loader().requests[0].1, "Samba Dancing");
    assert_eq!(session.scene().static_entities().len(), 4);
    assert_eq!(session.scene().dynamic_count(), 0);
}

#[test]
fn test_frames_render_before_asset_arrives() {
    let mut session = start(&ViewerConfig::default());

    for _ in 0..3 {
        assert!(session.frame().wants_next_frame());
    }

    let renders = &session.viewport().renderer().renders;
    assert_eq!(renders.len(), 3);
    assert!(renders.iter().all(|r| r.asset.is_none()));
    assert!(matches!(session.driver().state(), DriverState::Idle));
}

#[test]
fn test_last_completed_load_wins() {
    let mut session = start(&ViewerConfig::default());
    session.load_asset("Run");

    // Issued first, finishes last
    session.loader().succeed(1, animated_asset("Run", 1));
    session.loader().succeed(0, animated_asset("Samba Dancing", 1));
    session.frame();

    assert_eq!(current_asset(&session).as_deref(), Some("Samba Dancing"));
    assert_eq!(session.scene().dynamic_count(), 1);
    assert_eq!(
        session.driver().player().unwrap().clip().name(),
        "Samba Dancing 0"
    );
}

#[test]
fn test_hot_swap_replaces_asset_and_rebinds() {
    let mut session = start(&ViewerConfig::default());
    session.loader().succeed(0, animated_asset("Samba Dancing", 1));
    for _ in 0..10 {
        session.frame();
    }
    let first_generation = session.driver().player().unwrap().generation();

    session.load_asset("Walk");
    session.loader().succeed(1, animated_asset("Walk", 2));
    session.frame();

    let player = session.driver().player().unwrap();
    assert_eq!(current_asset(&session).as_deref(), Some("Walk"));
    assert!(player.generation() > first_generation);
    assert_eq!(player.clip().name(), "Walk 0");
    assert!((player.elapsed() - FRAME * 0.65).abs() < 1e-6);
}

#[test]
fn test_failed_load_leaves_scene_unchanged() {
    let mut session = start(&ViewerConfig::default());
    session.loader().succeed(0, animated_asset("Samba Dancing", 1));
    session.frame();

    session.load_asset("Missing");
    session.loader().fail(1);
    assert!(session.frame().wants_next_frame());

    assert_eq!(current_asset(&session).as_deref(), Some("Samba Dancing"));
    assert!(session.driver().is_bound());
}

#[test]
fn test_asset_without_clips_leaves_driver_idle() {
    let mut session = start(&ViewerConfig::default());
    session.loader().succeed(0, animated_asset("Statue", 0));

    assert!(session.frame().wants_next_frame());
    assert_eq!(current_asset(&session).as_deref(), Some("Statue"));
    assert!(!session.driver().is_bound());
}

#[test]
fn test_render_sees_pose_from_same_frame() {
    let mut session = start(&ViewerConfig::default());
    session.loader().succeed(0, animated_asset("Samba Dancing", 1));

    for _ in 0..4 {
        session.frame();
        let expected = session.driver().player().unwrap().local_time();
        let last = session.viewport().renderer().renders.last().unwrap();
        assert_eq!(last.clip_time, Some(expected));
    }
}

#[test]
fn test_resize_then_render_uses_exact_aspect() {
    let mut session = start(&ViewerConfig::default());
    session.resize(800, 600);
    session.frame();

    let renderer = session.viewport().renderer();
    assert_eq!(renderer.renders.last().unwrap().aspect, 800.0 / 600.0);
    assert_eq!(renderer.resizes.last(), Some(&SurfaceSize::new(800, 600)));
}

#[test]
fn test_host_resize_applies_at_next_frame() {
    let signal = ResizeSignal::new();
    let mut session = Session::start(
        &ViewerConfig::default(),
        RecordingRenderer::default(),
        ManualLoader::default(),
        &signal,
        ManualClock::fixed(FRAME),
        SurfaceSize::new(1280, 720),
    );

    signal.notify(SurfaceSize::new(640, 640));
    signal.notify(SurfaceSize::new(800, 400));
    session.frame();

    let renderer = session.viewport().renderer();
    assert_eq!(renderer.renders[0].aspect, 2.0);
    assert_eq!(renderer.resizes.len(), 2);
}

#[test]
fn test_teardown_twice_is_clean() {
    let mut session = start(&ViewerConfig::default());
    session.loader().succeed(0, animated_asset("Samba Dancing", 1));
    session.frame();

    session.teardown();
    session.teardown();

    assert_eq!(session.phase(), SessionPhase::TornDown);
    assert_eq!(session.viewport().renderer().releases, 1);
    assert_eq!(session.scene().dynamic_count(), 0);
    assert!(!session.driver().is_bound());
}

#[test]
fn test_teardown_before_first_load_ignores_late_completion() {
    let mut session = start(&ViewerConfig::default());
    session.teardown();

    let delivered = session.loader().succeed(0, animated_asset("Samba Dancing", 1));
    assert!(!delivered);

    assert_eq!(session.frame(), FrameOutcome::Stopped);
    assert_eq!(session.poll_loads(), 0);
    assert_eq!(session.scene().dynamic_count(), 0);
    assert!(session.viewport().renderer().renders.is_empty());
}

#[test]
fn test_no_callbacks_after_teardown() {
    let signal = ResizeSignal::new();
    let mut session = Session::start(
        &ViewerConfig::default(),
        RecordingRenderer::default(),
        ManualLoader::default(),
        &signal,
        ManualClock::fixed(FRAME),
        SurfaceSize::new(1280, 720),
    );
    session.frame();
    session.teardown();

    signal.notify(SurfaceSize::new(10, 10));
    session.resize(20, 20);
    assert!(session.load_asset("Walk").is_none());
    for _ in 0..3 {
        assert!(!session.frame().wants_next_frame());
    }

    let renderer = session.viewport().renderer();
    assert_eq!(renderer.renders.len(), 1);
    assert_eq!(renderer.resizes, vec![SurfaceSize::new(1280, 720)]);
    assert_eq!(session.loader().requests.len(), 1);
    assert_eq!(signal.listener_count(), 0);
}

#[test]
fn test_walk_end_to_end() {
    let config = ViewerConfig {
        asset: "Walk".into(),
        ..ViewerConfig::default()
    };
    let mut session = Session::start(
        &config,
        RecordingRenderer::default(),
        ThreadedLoader::new(MemorySource { clips: 1 }, AssetPath::default()),
        &ResizeSignal::new(),
        ManualClock::fixed(FRAME),
        SurfaceSize::new(1280, 720),
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    while session.poll_loads() == 0 {
        assert!(Instant::now() < deadline, "load never completed");
        std::thread::sleep(Duration::from_millis(1));
    }

    for _ in 0..5 {
        assert!(session.frame().wants_next_frame());
    }

    let player = session.driver().player().expect("driver bound");
    assert!((player.elapsed() - 0.0542).abs() < 1e-4);
    assert!((player.local_time() - 5.0 * FRAME * 0.65).abs() < 1e-6);

    let last = session.viewport().renderer().renders.last().unwrap();
    assert_eq!(last.asset.as_deref(), Some("Walk"));
    assert_eq!(last.clip_time, Some(player.local_time()));
}
