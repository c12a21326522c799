//! Behavioural tests for the gesture engine driven by synthetic faces


use face_gesture_mouse::{
    gestures::{GestureEvent, ScrollDirection},
    input_sink::{PointerAction, RecordingSink},
    params::Parameters,
    synthetic::SyntheticFace,
};
use nalgebra::Point2;
use test_helpers::{blink_at, engine, neutral, run_frames};

fn is_click(action: &PointerAction) -> bool {
    *action == PointerAction::Click
}

fn is_double_click(action: &PointerAction) -> bool {
    *action == PointerAction::DoubleClick
}

fn is_move(action: &PointerAction) -> bool {
    matches!(action, PointerAction::MoveTo { .. })
}

#[test]
fn test_two_quick_blinks_double_click() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();

    blink_at(&mut engine, &mut sink, &params, 0.0);
    blink_at(&mut engine, &mut sink, &params, 0.5);

    assert_eq!(sink.count(is_double_click), 1);
    assert_eq!(sink.count(is_click), 0);
}

#[test]
fn test_slow_blinks_click_and_rearm() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();

    blink_at(&mut engine, &mut sink, &params, 0.0);
    assert_eq!(sink.count(is_click), 0);

    blink_at(&mut engine, &mut sink, &params, 1.0);
    assert_eq!(sink.count(is_click), 1);
    assert_eq!(sink.count(is_double_click), 0);
    assert!(engine.blink().state().awaiting_second_click);
    assert_eq!(engine.blink().state().first_click_timestamp, 1.0);

    // The re-armed machine pairs with the next quick blink
    blink_at(&mut engine, &mut sink, &params, 1.3);
    assert_eq!(sink.count(is_double_click), 1);
}

#[test]
fn test_debounce_ignores_short_closures() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();
    let closed = test_helpers::eyes_closed();

    for cycle in 0..5 {
        let t = f64::from(cycle) * 0.3;
        let frames = [closed.clone(), closed.clone(), closed.clone(), neutral(), neutral(), neutral()];
        run_frames(&mut engine, &mut sink, &params, &frames, t, 0.03);
    }
    assert!(!engine.blink().state().awaiting_second_click);
    assert!(sink.actions().is_empty());
}

#[test]
fn test_right_click_cooldown() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();
    let raised = SyntheticFace::default().brow_raise(0.02).landmarks();

    for t in [0.0, 0.2, 0.5] {
        engine.process(Some(&raised), t, &params, &mut sink);
    }
    assert_eq!(sink.actions(), vec![PointerAction::RightClick]);

    engine.process(Some(&raised), 1.2, &params, &mut sink);
    assert_eq!(sink.count(|a| *a == PointerAction::RightClick), 2);
}

#[test]
fn test_scroll_direction_locked_until_mouth_closes() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters {
        ema_alpha: 1.0,
        ..Parameters::default()
    };
    let open_at = |x: f64, y: f64| SyntheticFace::default().head(x, y).mouth_open(0.05).landmarks();

    engine.process(Some(&open_at(0.5, 0.5)), 0.0, &params, &mut sink);
    let anchor = engine.scroll().anchor().unwrap();
    assert!(nalgebra::distance(&anchor, &Point2::new(0.5, 0.5)) < 1e-9);

    let outcome = engine.process(Some(&open_at(0.5, 0.49)), 0.1, &params, &mut sink);
    assert!(outcome.events.contains(&GestureEvent::ScrollLocked(ScrollDirection::Up)));

    // Head swings the other way; the lock holds and keeps scrolling up
    sink.clear();
    engine.process(Some(&open_at(0.5, 0.56)), 0.2, &params, &mut sink);
    engine.process(Some(&open_at(0.5, 0.58)), 0.3, &params, &mut sink);
    assert_eq!(engine.scroll().direction(), ScrollDirection::Up);
    assert_eq!(sink.count(|a| *a == PointerAction::ScrollVertical(50)), 2);
    assert_eq!(sink.count(|a| *a == PointerAction::ScrollVertical(-50)), 0);

    // Closing releases; reopening can lock a new direction
    let closed = SyntheticFace::default().head(0.5, 0.58).landmarks();
    let outcome = engine.process(Some(&closed), 0.4, &params, &mut sink);
    assert_eq!(outcome.events, vec![GestureEvent::ScrollReleased]);
    assert_eq!(engine.scroll().direction(), ScrollDirection::None);

    engine.process(Some(&open_at(0.5, 0.58)), 0.5, &params, &mut sink);
    let outcome = engine.process(Some(&open_at(0.5, 0.62)), 0.6, &params, &mut sink);
    assert!(outcome.events.contains(&GestureEvent::ScrollLocked(ScrollDirection::Down)));
}

#[test]
fn test_horizontal_scroll() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters {
        ema_alpha: 1.0,
        ..Parameters::default()
    };
    let open_at = |x: f64| SyntheticFace::default().head(x, 0.5).mouth_open(0.05).landmarks();

    engine.process(Some(&open_at(0.5)), 0.0, &params, &mut sink);
    engine.process(Some(&open_at(0.45)), 0.1, &params, &mut sink);
    assert_eq!(engine.scroll().direction(), ScrollDirection::Left);

    sink.clear();
    engine.process(Some(&open_at(0.45)), 0.2, &params, &mut sink);
    assert_eq!(sink.count(|a| *a == PointerAction::ScrollHorizontal(-50)), 1);
}

#[test]
fn test_cursor_holds_during_blink() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();
    let right = SyntheticFace::default().head(0.6, 0.5);

    let open_frames = vec![right.landmarks(); 5];
    run_frames(&mut engine, &mut sink, &params, &open_frames, 0.0, 0.03);
    let moves_before = sink.count(is_move);
    let smoothed_before = engine.cursor().smoothed();
    assert!(moves_before > 0);
    assert!(smoothed_before.x > 0.5);

    let closed = right.eye_openness(0.2).landmarks();
    let outcomes = run_frames(&mut engine, &mut sink, &params, &[closed.clone(), closed], 0.15, 0.03);
    assert!(outcomes.iter().all(|o| o.blink_frame));
    assert_eq!(sink.count(is_move), moves_before);
    assert_eq!(engine.cursor().smoothed(), smoothed_before);

    // Smoothing resumes from the pre-blink value, not from the center
    engine.process(Some(&right.landmarks()), 0.21, &params, &mut sink);
    let expected = params.ema_alpha * 0.6 + (1.0 - params.ema_alpha) * smoothed_before.x;
    assert!((engine.cursor().smoothed().x - expected).abs() < 1e-9);
    assert_eq!(sink.count(is_move), moves_before + 1);
    // Two closed frames are below the blink debounce
    assert_eq!(sink.count(is_click), 0);
}

#[test]
fn test_scroll_step_update_takes_effect() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let mut params = Parameters {
        ema_alpha: 1.0,
        ..Parameters::default()
    };
    params.update("SCROLL_STEP", 80.0).unwrap();

    let open_at = |y: f64| SyntheticFace::default().head(0.5, y).mouth_open(0.05).landmarks();
    engine.process(Some(&open_at(0.5)), 0.0, &params, &mut sink);
    engine.process(Some(&open_at(0.53)), 0.1, &params, &mut sink);
    engine.process(Some(&open_at(0.53)), 0.2, &params, &mut sink);

    assert_eq!(sink.count(|a| *a == PointerAction::ScrollVertical(-80)), 1);
    assert_eq!(sink.count(|a| *a == PointerAction::ScrollVertical(-50)), 0);
}

#[test]
fn test_missing_face_changes_nothing() {
    let mut engine = engine();
    let mut sink = RecordingSink::default();
    let params = Parameters::default();

    blink_at(&mut engine, &mut sink, &params, 0.0);
    let state = *engine.blink().state();
    for i in 0..10 {
        let outcome = engine.process(None, 0.1 + f64::from(i) * 0.1, &params, &mut sink);
        assert!(outcome.actions.is_empty());
    }
    assert_eq!(*engine.blink().state(), state);
    assert!(sink.actions().is_empty());
}
