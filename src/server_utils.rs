use crate::constants::{MAX_LEVEL, MIN_LEVEL};

pub const DEFAULT_PORT: u16 = 8080;

pub fn normalize_level(value: Option<i64>) -> u32 {
    value
        .unwrap_or(MIN_LEVEL as i64)
        .clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u32
}

/// Client seeds wrap into the engine's `u32` seed space; absent seeds use `fallback`.
pub fn normalize_seed(value: Option<i64>, fallback: u32) -> u32 {
    match value {
        Some(seed) => seed as u32,
        None => fallback,
    }
}

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_level_clamps_range() {
        assert_eq!(normalize_level(None), 1);
        assert_eq!(normalize_level(Some(-5)), 1);
        assert_eq!(normalize_level(Some(2)), 2);
        assert_eq!(normalize_level(Some(99)), 3);
    }

    #[test]
    fn normalize_seed_wraps_and_falls_back() {
        assert_eq!(normalize_seed(None, 17), 17);
        assert_eq!(normalize_seed(Some(42), 17), 42);
        assert_eq!(normalize_seed(Some(-1), 17), u32::MAX);
        assert_eq!(normalize_seed(Some(1 << 32), 17), 0);
    }

    #[test]
    fn port_parsing_is_lenient() {
        assert_eq!(parse_port(Some("3000")), 3000);
        assert_eq!(parse_port(Some(" 3000 ")), 3000);
        assert_eq!(parse_port(Some("abc")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(parse_port(None), DEFAULT_PORT);
    }
}
