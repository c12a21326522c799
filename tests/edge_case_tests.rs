//! Edge case tests for landmark geometry, coordinate mapping and pointer sinks


use face_gesture_mouse::{
    cursor_control::wheel_notches,
    geometry::{average_ear, eye_aspect_ratio, mouth_aperture, FaceSignals},
    constants::{LEFT_EYE_EAR, NUM_FACE_MESH_LANDMARKS},
    input_sink::{InputSink, PointerAction, RecordingSink},
    landmarks::LandmarkSet,
    params::Parameters,
    synthetic::SyntheticFace,
    utils::to_screen,
    Error,
};
use test_helpers::engine;

#[test]
fn test_landmark_set_size_limits() {
    assert!(matches!(
        LandmarkSet::from_pairs(&[(0.5, 0.5); NUM_FACE_MESH_LANDMARKS - 1]),
        Err(Error::InvalidInput(_))
    ));
    assert!(LandmarkSet::from_pairs(&[(0.5, 0.5); NUM_FACE_MESH_LANDMARKS]).is_ok());
    // Meshes with iris points (478) are accepted too
    assert!(LandmarkSet::from_pairs(&[(0.5, 0.5); 478]).is_ok());
}

#[test]
fn test_collapsed_face() {
    let face = LandmarkSet::from_pairs(&[(0.3, 0.7); NUM_FACE_MESH_LANDMARKS]).unwrap();
    assert_eq!(eye_aspect_ratio(&face, &LEFT_EYE_EAR), 0.0);
    assert_eq!(average_ear(&face), 0.0);
    assert_eq!(mouth_aperture(&face), 0.0);

    let signals = FaceSignals::measure(&face);
    assert_eq!(signals.eyebrow_left, 0.0);
    assert!((signals.head.x - 0.3).abs() < 1e-12);
}

#[test]
fn test_fully_closed_eyes() {
    let face = SyntheticFace::default().eye_openness(0.0).landmarks();
    assert_eq!(average_ear(&face), 0.0);
}

#[test]
fn test_screen_mapping_extremes() {
    assert_eq!(to_screen(f64::INFINITY, 1920), 0);
    assert_eq!(to_screen(f64::NEG_INFINITY, 1920), 0);
    assert_eq!(to_screen(0.25, 0), 0);
    assert_eq!(to_screen(1.0, u32::MAX), i32::MAX);
}

#[test]
fn test_head_far_off_center_clamps() {
    let mut engine = engine();
    let mut sink = RecordingSink::new(800, 600);
    let params = Parameters {
        ema_alpha: 1.0,
        ..Parameters::default()
    };
    let face = SyntheticFace::default().head(0.95, 0.05).landmarks();
    engine.process(Some(&face), 0.0, &params, &mut sink);
    assert_eq!(sink.actions(), vec![PointerAction::MoveTo { x: 800, y: 0 }]);
}

#[test]
fn test_wheel_notches_never_zero() {
    assert_eq!(wheel_notches(1), 1);
    assert_eq!(wheel_notches(-1), 1);
    assert_eq!(wheel_notches(i32::MIN), 214_748_364);
}

#[test]
fn test_boxed_sink_forwards() {
    let recorder = RecordingSink::new(640, 480);
    let mut boxed: Box<dyn InputSink> = Box::new(recorder.clone());
    assert_eq!(boxed.screen_size(), (640, 480));
    boxed.perform(PointerAction::ScrollHorizontal(-50)).unwrap();
    boxed.perform(PointerAction::DoubleClick).unwrap();
    assert_eq!(
        recorder.actions(),
        vec![PointerAction::ScrollHorizontal(-50), PointerAction::DoubleClick]
    );
}
