use std::time::Duration;

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Formats seconds as `HH:MM:SS.m`, truncating to whole milliseconds.
///
/// Hours, minutes and seconds are zero-padded to two digits; hours widen past
/// 99 instead of wrapping. The millisecond remainder is written unpadded, so
/// 12.005 seconds renders as `00:00:12.5`. Negative and non-finite input
/// renders as zero.
pub fn to_sexagesimal(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).trunc() as u64
    } else {
        0
    };
    let hours = total_ms / MS_PER_HOUR;
    let rem = total_ms % MS_PER_HOUR;
    let minutes = rem / MS_PER_MINUTE;
    let rem = rem % MS_PER_MINUTE;
    let secs = rem / MS_PER_SECOND;
    let millis = rem % MS_PER_SECOND;
    format!(
        "{}:{}:{}.{millis}",
        to_chapter_id(hours as usize),
        to_chapter_id(minutes as usize),
        to_chapter_id(secs as usize)
    )
}

/// Decodes the output of [`to_sexagesimal`] back into seconds.
pub fn from_sexagesimal(text: &str) -> Option<f64> {
    let mut parts = text.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let (secs, millis) = parts.next()?.split_once('.')?;
    let secs: u64 = secs.parse().ok()?;
    let millis: u64 = millis.parse().ok()?;
    let total_ms = hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + secs * MS_PER_SECOND + millis;
    Some(total_ms as f64 / 1000.0)
}

/// Two-digit zero-padded decimal; indices of 100 and above keep every digit.
pub fn to_chapter_id(index: usize) -> String {
    format!("{index:02}")
}

pub fn format_duration(duration: Duration) -> String {
    to_sexagesimal(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn formats_zero_and_simple_offsets() {
        assert_eq!(to_sexagesimal(0.0), "00:00:00.0");
        assert_eq!(to_sexagesimal(12.0), "00:00:12.0");
        assert_eq!(to_sexagesimal(61.25), "00:01:01.250");
        assert_eq!(to_sexagesimal(3_723.5), "01:02:03.500");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(to_sexagesimal(1.9999), "00:00:01.999");
        assert_eq!(to_sexagesimal(0.0004), "00:00:00.0");
    }

    #[test]
    fn hours_widen_past_two_digits() {
        assert_eq!(to_sexagesimal(100.0 * 3600.0), "100:00:00.0");
    }

    #[test]
    fn degenerate_input_renders_as_zero() {
        assert_eq!(to_sexagesimal(-5.0), "00:00:00.0");
        assert_eq!(to_sexagesimal(f64::NAN), "00:00:00.0");
        assert_eq!(to_sexagesimal(f64::INFINITY), "00:00:00.0");
    }

    #[test]
    fn matches_grammar_and_decodes_to_truncated_millis() {
        let re = Regex::new(r"^\d+:\d{2}:\d{2}\.\d+$").expect("regex");
        for t in [0.0, 0.001, 9.5, 59.999, 60.0, 3599.9994, 86_400.123, 400_000.5] {
            let text = to_sexagesimal(t);
            assert!(re.is_match(&text), "unexpected format: {text}");
            let decoded = from_sexagesimal(&text).expect("decode");
            let expected = (t * 1000.0).trunc() / 1000.0;
            assert!((decoded - expected).abs() < 1e-9, "{t} -> {text} -> {decoded}");
        }
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert_eq!(from_sexagesimal("12"), None);
        assert_eq!(from_sexagesimal("00:00:12"), None);
        assert_eq!(from_sexagesimal("aa:00:12.0"), None);
    }

    #[test]
    fn chapter_ids_pad_to_two_digits_then_widen() {
        assert_eq!(to_chapter_id(0), "00");
        assert_eq!(to_chapter_id(7), "07");
        assert_eq!(to_chapter_id(99), "99");
        assert_eq!(to_chapter_id(100), "100");
        assert_eq!(to_chapter_id(1234), "1234");
    }

    #[test]
    fn formats_wall_clock_durations() {
        assert_eq!(format_duration(Duration::from_millis(90_500)), "00:01:30.500");
    }
}
