//! Tests for stop criteria.

use super::*;
use std::thread;
use std::time::Duration;

fn obj(value: f64) -> Evaluation {
    Evaluation::from_objective(value)
}

#[test]
fn test_iteration_bound_is_strict() {
    let stop = StopTimeIteration::iterations(3);
    for _ in 0..3 {
        assert!(!stop.stop());
        stop.increment_counter();
    }
    assert!(!stop.stop());
    stop.increment_counter();
    assert!(stop.stop());
}

#[test]
fn test_time_bound() {
    let stop = StopTimeIteration::time(Duration::from_millis(20));
    assert!(!stop.stop());
    thread::sleep(Duration::from_millis(40));
    assert!(stop.stop());

    stop.reset();
    assert!(!stop.stop());
}

#[test]
fn test_unbounded_never_stops() {
    let stop = StopTimeIteration::unbounded();
    for _ in 0..1000 {
        stop.increment_counter();
    }
    assert!(!stop.stop());
    assert_eq!(stop.progress(), 0.0);
}

#[test]
fn test_reset_zeroes_counter() {
    let stop = StopTimeIteration::iterations(1);
    stop.increment_counter();
    stop.increment_counter();
    assert!(stop.stop());
    stop.reset();
    assert_eq!(stop.counter(), 0);
    assert!(!stop.stop());
}

#[test]
fn test_progress_fraction() {
    let stop = StopTimeIteration::iterations(4).with_progress_step(0.25).unwrap();
    stop.increment_counter();
    assert!((stop.progress() - 0.25).abs() < 1e-12);
    for _ in 0..10 {
        stop.increment_counter();
    }
    assert_eq!(stop.progress(), 1.0);
}

#[test]
fn test_invalid_progress_step() {
    assert!(StopTimeIteration::unbounded().with_progress_step(0.0).is_err());
    assert!(StopTimeIteration::unbounded().with_progress_step(1.5).is_err());
}

#[test]
fn test_box_clone_starts_fresh() {
    let stop = StopTimeIteration::iterations(0);
    stop.increment_counter();
    assert!(stop.stop());

    let copy = stop.box_clone();
    assert!(!copy.stop());
}

#[test]
fn test_current_status_mentions_iterations() {
    let stop = StopTimeIteration::new(Some(Duration::from_secs(10)), Some(10));
    stop.increment_counter();
    let status = stop.current_status();
    assert!(status.contains("iteration: 1"));
    assert!(status.contains("time:"));
}

#[test]
fn test_no_improvement_rejects_zero_window() {
    assert!(StopNoImprovement::with_window(StopTimeIteration::unbounded(), 0).is_err());
    assert!(StopNoImprovement::new(StopTimeIteration::unbounded(), 3, -1.0).is_err());
}

#[test]
fn test_no_improvement_false_while_window_unfilled() {
    let stop = StopNoImprovement::with_window(StopTimeIteration::unbounded(), 3).unwrap();
    for _ in 0..2 {
        assert!(!stop.stop_on_evaluations(&[obj(5.0)]));
        stop.increment_counter();
    }
    assert!(!stop.stop_on_evaluations(&[obj(5.0)]));
}

#[test]
fn test_no_improvement_fires_on_plateau() {
    let stop = StopNoImprovement::with_window(StopTimeIteration::unbounded(), 3).unwrap();
    for _ in 0..3 {
        assert!(!stop.stop_on_evaluations(&[obj(5.0)]));
        stop.increment_counter();
    }
    assert!(stop.stop_on_evaluations(&[obj(5.0)]));
}

#[test]
fn test_no_improvement_keeps_going_while_improving() {
    let stop = StopNoImprovement::new(StopTimeIteration::unbounded(), 3, 0.01).unwrap();
    let mut value = 100.0;
    for _ in 0..10 {
        assert!(!stop.stop_on_evaluations(&[obj(value)]));
        stop.increment_counter();
        value *= 0.9;
    }
}

#[test]
fn test_no_improvement_zero_objective() {
    let stop = StopNoImprovement::with_window(StopTimeIteration::unbounded(), 2).unwrap();
    for _ in 0..2 {
        stop.stop_on_evaluations(&[obj(0.0)]);
        stop.increment_counter();
    }
    assert!(stop.stop_on_evaluations(&[obj(0.0)]));
}

#[test]
fn test_no_improvement_inner_bound_still_applies() {
    let stop = StopNoImprovement::with_window(StopTimeIteration::iterations(1), 50).unwrap();
    stop.increment_counter();
    stop.increment_counter();
    assert!(stop.stop());
    assert!(stop.stop_on_evaluations(&[obj(1.0)]));
}

#[test]
fn test_no_improvement_reset_clears_window() {
    let stop = StopNoImprovement::with_window(StopTimeIteration::unbounded(), 1).unwrap();
    stop.stop_on_evaluations(&[obj(2.0)]);
    stop.increment_counter();
    assert!(stop.stop_on_evaluations(&[obj(2.0)]));

    stop.reset();
    assert!(!stop.stop_on_evaluations(&[obj(2.0)]));
}
