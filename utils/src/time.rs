//! Time formatting helpers.

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Convert a voting duration in minutes to seconds, `None` on overflow.
pub fn minutes_to_secs(minutes: u64) -> Option<u64> {
    minutes.checked_mul(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_unit() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3_720), "1h 2m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }

    #[test]
    fn minutes_overflow_is_detected() {
        assert_eq!(minutes_to_secs(2), Some(120));
        assert_eq!(minutes_to_secs(u64::MAX), None);
    }
}
