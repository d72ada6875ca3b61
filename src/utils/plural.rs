//! Pluralization helpers for log lines.

/// Return "s" suffix for plural counts
///
/// - `plural_s(0)` -> `"s"` (0 assets)
/// - `plural_s(1)` -> `""` (1 asset)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, e.g. `plural_count(2, "repair")` -> `"2 repairs"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "asset"), "0 assets");
        assert_eq!(plural_count(1, "asset"), "1 asset");
        assert_eq!(plural_count(3, "repair"), "3 repairs");
    }
}
