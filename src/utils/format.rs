//! Compact duration strings for report tables.
//!
//! Every duration is rendered with the two coarsest adjacent units that fit
//! its magnitude (`"2ms 345us"`), the minor unit zero-padded so that strings
//! from the same bucket always have the same length.

/// Picoseconds per unit.
pub const PS_PER_NS: i64 = 1_000;
pub const PS_PER_US: i64 = 1_000 * PS_PER_NS;
pub const PS_PER_MS: i64 = 1_000 * PS_PER_US;
pub const PS_PER_S: i64 = 1_000 * PS_PER_MS;
pub const PS_PER_MIN: i64 = 60 * PS_PER_S;
pub const PS_PER_HOUR: i64 = 60 * PS_PER_MIN;
pub const PS_PER_DAY: i64 = 24 * PS_PER_HOUR;

/// One formatting bucket: durations strictly below `ceiling` use it.
struct Bucket {
    ceiling: i64,
    major: i64,
    major_unit: &'static str,
    minor: i64,
    minor_unit: &'static str,
    minor_width: usize,
}

const BUCKETS: [Bucket; 7] = [
    Bucket { ceiling: PS_PER_US, major: PS_PER_NS, major_unit: "ns", minor: 1, minor_unit: "ps", minor_width: 3 },
    Bucket { ceiling: PS_PER_MS, major: PS_PER_US, major_unit: "us", minor: PS_PER_NS, minor_unit: "ns", minor_width: 3 },
    Bucket { ceiling: PS_PER_S, major: PS_PER_MS, major_unit: "ms", minor: PS_PER_US, minor_unit: "us", minor_width: 3 },
    Bucket { ceiling: PS_PER_MIN, major: PS_PER_S, major_unit: "s", minor: PS_PER_MS, minor_unit: "ms", minor_width: 3 },
    Bucket { ceiling: PS_PER_HOUR, major: PS_PER_MIN, major_unit: "m", minor: PS_PER_S, minor_unit: "s", minor_width: 2 },
    Bucket { ceiling: PS_PER_DAY, major: PS_PER_HOUR, major_unit: "h", minor: PS_PER_MIN, minor_unit: "m", minor_width: 2 },
    Bucket { ceiling: i64::MAX, major: PS_PER_DAY, major_unit: "d", minor: PS_PER_HOUR, minor_unit: "h", minor_width: 2 },
];

/// Format a duration given in picoseconds.
///
/// Output is 3 to 11 characters long for the whole `0..=i64::MAX` range
/// (about 106 days). Negative durations are shown as `0ps`.
pub fn format_duration(duration_ps: i64) -> String {
    let duration_ps = duration_ps.max(0);
    if duration_ps < PS_PER_NS {
        return format!("{}ps", duration_ps);
    }

    // The last bucket's ceiling is i64::MAX itself, so it has to be a fallback
    // rather than a strict comparison.
    let bucket = BUCKETS
        .iter()
        .find(|b| duration_ps < b.ceiling)
        .unwrap_or(&BUCKETS[BUCKETS.len() - 1]);

    let major = duration_ps / bucket.major;
    let minor = (duration_ps % bucket.major) / bucket.minor;
    format!(
        "{}{} {:0width$}{}",
        major,
        bucket.major_unit,
        minor,
        bucket.minor_unit,
        width = bucket.minor_width
    )
}

/// Format a duration given in nanoseconds (coarse clock readings).
pub fn format_duration_ns(duration_ns: i64) -> String {
    format_duration(duration_ns.saturating_mul(PS_PER_NS))
}

/// Format a percentage with one decimal place.
///
/// Extreme values above 1000% are truncated to an integer so a single outlier
/// does not widen the whole column.
pub fn format_percentage(percentage: f64) -> String {
    if percentage > 1000.0 {
        format!("{}", percentage.trunc() as i64)
    } else {
        format!("{:.1}", percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_picoseconds_only() {
        assert_eq!(format_duration(0), "0ps");
        assert_eq!(format_duration(7), "7ps");
        assert_eq!(format_duration(999), "999ps");
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(format_duration(-5), "0ps");
        assert_eq!(format_duration(i64::MIN), "0ps");
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(format_duration(1_000), "1ns 000ps");
        assert_eq!(format_duration(999_000), "999ns 000ps");
        assert_eq!(format_duration(999_999), "999ns 999ps");
        assert_eq!(format_duration(1_000_000), "1us 000ns");
        assert_eq!(format_duration(999 * PS_PER_US + 999 * PS_PER_NS), "999us 999ns");
        assert_eq!(format_duration(PS_PER_MS), "1ms 000us");
        assert_eq!(format_duration(PS_PER_S - 1), "999ms 999us");
        assert_eq!(format_duration(PS_PER_S), "1s 000ms");
        assert_eq!(format_duration(PS_PER_MIN - 1), "59s 999ms");
        assert_eq!(format_duration(PS_PER_MIN), "1m 00s");
        assert_eq!(format_duration(PS_PER_HOUR - 1), "59m 59s");
        assert_eq!(format_duration(PS_PER_HOUR), "1h 00m");
        assert_eq!(format_duration(PS_PER_DAY - 1), "23h 59m");
        assert_eq!(format_duration(PS_PER_DAY), "1d 00h");
    }

    #[test]
    fn test_minor_zero_padding() {
        assert_eq!(format_duration(2 * PS_PER_MS + 45 * PS_PER_US), "2ms 045us");
        assert_eq!(format_duration(3 * PS_PER_MIN + 7 * PS_PER_S), "3m 07s");
        assert_eq!(format_duration(5 * PS_PER_DAY + 3 * PS_PER_HOUR), "5d 03h");
    }

    #[test]
    fn test_largest_value() {
        // i64::MAX ps is 106 days and 18 hours
        assert_eq!(format_duration(i64::MAX), "106d 18h");
    }

    #[test]
    fn test_format_duration_ns() {
        assert_eq!(format_duration_ns(1_500), "1us 500ns");
        assert_eq!(format_duration_ns(i64::MAX), "106d 18h");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(100.0), "100.0");
        assert_eq!(format_percentage(200.04), "200.0");
        assert_eq!(format_percentage(1000.0), "1000.0");
        assert_eq!(format_percentage(1234.5), "1234");
    }

    proptest! {
        #[test]
        fn prop_sub_nanosecond_is_picoseconds_only(d in 0i64..1000) {
            let s = format_duration(d);
            prop_assert!(s.ends_with("ps"));
            prop_assert!(!s.contains(' '));
            prop_assert!(!s.contains("ns"));
        }

        #[test]
        fn prop_length_within_bounds(d in 0i64..=i64::MAX) {
            let len = format_duration(d).len();
            prop_assert!((3..=11).contains(&len), "len {} for {}", len, d);
        }

        #[test]
        fn prop_same_bucket_same_length(major in 1i64..10, a in 0i64..1000, b in 0i64..1000) {
            let x = format_duration(major * PS_PER_US + a * PS_PER_NS);
            let y = format_duration(major * PS_PER_US + b * PS_PER_NS);
            prop_assert_eq!(x.len(), y.len());
        }
    }
}
