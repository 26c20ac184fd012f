use crate::constants::MAX_TICK_SECS;
use crate::types::Position;

pub(super) fn box_center(x: f64, y: f64, size: f64) -> Position {
    Position {
        x: x + size / 2.0,
        y: y + size / 2.0,
    }
}

pub(super) fn circles_overlap(a: Position, a_radius: f64, b: Position, b_radius: f64) -> bool {
    a.distance(b) < a_radius + b_radius
}

/// Negative or non-finite deltas advance nothing; long stalls advance at most
/// `MAX_TICK_SECS`.
pub(super) fn sanitize_dt(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 {
        dt.min(MAX_TICK_SECS)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_circles_do_not_overlap() {
        let a = Position { x: 0.0, y: 0.0 };
        let b = Position { x: 30.0, y: 0.0 };
        assert!(!circles_overlap(a, 20.0, b, 10.0));
        assert!(circles_overlap(a, 20.0, Position { x: 29.9, y: 0.0 }, 10.0));
    }

    #[test]
    fn bad_deltas_are_zeroed() {
        assert_eq!(sanitize_dt(-1.0), 0.0);
        assert_eq!(sanitize_dt(f64::NAN), 0.0);
        assert_eq!(sanitize_dt(f64::INFINITY), 0.0);
        assert_eq!(sanitize_dt(0.1), 0.1);
    }

    #[test]
    fn huge_deltas_are_capped() {
        assert_eq!(sanitize_dt(2.0), MAX_TICK_SECS);
        assert_eq!(sanitize_dt(1e18), MAX_TICK_SECS);
        assert_eq!(sanitize_dt(f64::MAX), MAX_TICK_SECS);
    }

    #[test]
    fn box_center_is_offset_by_half_size() {
        let center = box_center(4.0, 8.0, 32.0);
        assert_eq!(center, Position { x: 20.0, y: 24.0 });
    }
}
