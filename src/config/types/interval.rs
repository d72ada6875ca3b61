//! Cycle interval parsing.

use std::time::Duration;

use super::ConfigError;

/// Parse an interval string into a duration.
///
/// A trailing `s`, `m` or `h` multiplies the numeric prefix by 1, 60 or 3600;
/// an unsuffixed value is seconds. Fractional values round to whole seconds.
///
/// ```ignore
/// parse_interval("5m")  -> 300s
/// parse_interval("2h")  -> 7200s
/// parse_interval("45")  -> 45s
/// parse_interval("x5m") -> Err(InvalidInterval)
/// ```
pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidInterval(raw.to_string());
    let s = raw.trim();

    let (number, unit) = match s.as_bytes().last() {
        Some(b's') => (&s[..s.len() - 1], 1.0),
        Some(b'm') => (&s[..s.len() - 1], 60.0),
        Some(b'h') => (&s[..s.len() - 1], 3600.0),
        _ => (s, 1.0),
    };

    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok(Duration::from_secs((value * unit).round() as u64))
}

/// Seconds from a float config value. Negative and NaN values are zero;
/// values too large for a `Duration` saturate.
pub fn duration_from_secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: &str) -> u64 {
        parse_interval(s).unwrap().as_secs()
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(secs("5m"), 300);
        assert_eq!(secs("2h"), 7200);
        assert_eq!(secs("90s"), 90);
        assert_eq!(secs("45"), 45);
    }

    #[test]
    fn test_whitespace_and_fractions() {
        assert_eq!(secs(" 10m "), 600);
        assert_eq!(secs("1.5h"), 5400);
        assert_eq!(secs("0"), 0);
    }

    #[test]
    fn test_invalid() {
        for bad in ["abc", "m", "", "5x", "x5m", "-5m", "infh", "NaN"] {
            assert!(
                matches!(parse_interval(bad), Err(ConfigError::InvalidInterval(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_duration_from_secs_never_panics() {
        assert_eq!(duration_from_secs(1.5), Duration::from_millis(1500));
        assert_eq!(duration_from_secs(-3.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(1e20), Duration::MAX);
        assert_eq!(duration_from_secs(f64::INFINITY), Duration::MAX);
    }
}
