//! Human-readable durations for run summaries.

use std::time::Duration;

/// Format a duration as `HH:MM:SS.ss`.
///
/// Hours are not wrapped, so a 30 hour run prints as `30:00:00.00`.
pub fn format_elapsed(elapsed: Duration) -> String {
    // Round to hundredths first so 59.996s carries into the next minute.
    let hundredths = (elapsed.as_nanos() + 5_000_000) / 10_000_000;
    let hours = hundredths / 360_000;
    let minutes = (hundredths % 360_000) / 6_000;
    let seconds = (hundredths % 6_000) / 100;
    let fraction = hundredths % 100;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(5_500)), "00:00:05.50");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "00:01:05.00");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 61)), "03:01:01.00");
        assert_eq!(format_elapsed(Duration::from_secs(30 * 3600)), "30:00:00.00");
    }

    #[test]
    fn test_format_elapsed_rounding_carries() {
        assert_eq!(format_elapsed(Duration::from_millis(59_996)), "00:01:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(3_599_999)), "01:00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(1_234)), "00:00:01.23");
        assert_eq!(format_elapsed(Duration::from_micros(1_235_001)), "00:00:01.24");
    }
}
