/// Round half-up, matching how the model tooling rounds coordinates
/// (`-2.5` rounds to `-2`, not `-3`).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Nearest multiple of `factor`.
pub fn round_by_factor(value: f64, factor: f64) -> f64 {
    round_half_up(value / factor) * factor
}

/// Largest multiple of `factor` not above `value`.
pub fn floor_by_factor(value: f64, factor: f64) -> f64 {
    (value / factor).floor() * factor
}

/// Smallest multiple of `factor` not below `value`.
pub fn ceil_by_factor(value: f64, factor: f64) -> f64 {
    (value / factor).ceil() * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_multiple() {
        assert_eq!(round_by_factor(1920.0, 28.0), 1932.0);
        assert_eq!(round_by_factor(1080.0, 28.0), 1092.0);
        assert_eq!(round_by_factor(14.0, 28.0), 28.0);
        assert_eq!(round_by_factor(10.0, 28.0), 0.0);
    }

    #[test]
    fn floors_and_ceils_to_multiple() {
        assert_eq!(floor_by_factor(55.0, 28.0), 28.0);
        assert_eq!(ceil_by_factor(29.0, 28.0), 56.0);
        assert_eq!(ceil_by_factor(56.0, 28.0), 56.0);
    }

    #[test]
    fn half_up_rounding_goes_toward_positive_infinity() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(319.4), 319.0);
    }
}
