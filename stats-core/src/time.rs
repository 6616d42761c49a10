// Lap time codec. All durations are integer ticks of 10 ms, the protocol's
// native unit. Formatting is h:mm.ss.cc with the hour and its separator
// omitted when zero.

const TICKS_PER_SECOND: u32 = 100;
const TICKS_PER_MINUTE: u32 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: u32 = 60 * TICKS_PER_MINUTE;

pub fn format_ticks(ticks: u32) -> String {
    let hours = ticks / TICKS_PER_HOUR;
    let minutes = (ticks % TICKS_PER_HOUR) / TICKS_PER_MINUTE;
    let seconds = (ticks % TICKS_PER_MINUTE) / TICKS_PER_SECOND;
    let centis = ticks % TICKS_PER_SECOND;
    if hours > 0 {
        format!("{}:{:02}.{:02}.{:02}", hours, minutes, seconds, centis)
    } else {
        format!("{}.{:02}.{:02}", minutes, seconds, centis)
    }
}

/// Gap rendering for leaderboard columns, always prefixed with `+`.
pub fn format_gap(ticks: u32) -> String {
    if ticks >= TICKS_PER_MINUTE {
        format!("+{}", format_ticks(ticks))
    } else {
        format!("+{}.{:02}", ticks / TICKS_PER_SECOND, ticks % TICKS_PER_SECOND)
    }
}

/// Parses `h:mm.ss.cc`, `m.ss.cc` or `ss.cc`. A colon is accepted in place
/// of any dot separator, and a three-digit final component is read as
/// milliseconds. Returns None on anything else.
pub fn parse_ticks(text: &str) -> Option<u32> {
    let normalized = text.trim().replace(':', ".");
    let parts: Vec<&str> = normalized.split('.').collect();
    if parts.len() < 2 || parts.len() > 4 {
        return None;
    }

    let frac_text = parts[parts.len() - 1];
    let frac: u32 = frac_text.parse().ok()?;
    let centis = match frac_text.len() {
        1 | 2 => frac,
        3 => frac / 10,
        _ => return None,
    };
    if centis >= 100 {
        return None;
    }

    let mut whole = [0u32; 3]; // hours, minutes, seconds
    let fields = &parts[..parts.len() - 1];
    for (slot, field) in whole[3 - fields.len()..].iter_mut().zip(fields) {
        *slot = field.parse().ok()?;
    }
    let [hours, minutes, seconds] = whole;
    if minutes >= 60 && hours > 0 {
        return None;
    }
    if seconds >= 60 && (minutes > 0 || hours > 0) {
        return None;
    }

    Some(hours * TICKS_PER_HOUR + minutes * TICKS_PER_MINUTE + seconds * TICKS_PER_SECOND + centis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_without_hour() {
        assert_eq!(format_ticks(9000), "1.30.00");
        assert_eq!(format_ticks(8980), "1.29.80");
        assert_eq!(format_ticks(42), "0.00.42");
    }

    #[test]
    fn formats_hours_with_separator() {
        // 1 h 02 m 03.45 s
        assert_eq!(format_ticks(372345), "1:02.03.45");
    }

    #[test]
    fn formats_gaps() {
        assert_eq!(format_gap(530), "+5.30");
        assert_eq!(format_gap(9150 - 8980), "+1.70");
        assert_eq!(format_gap(6100), "+1.01.00");
    }

    #[test]
    fn parses_all_accepted_shapes() {
        assert_eq!(parse_ticks("1.30.00"), Some(9000));
        assert_eq!(parse_ticks("1:30.00"), Some(9000));
        assert_eq!(parse_ticks("1:29.800"), Some(8980));
        assert_eq!(parse_ticks("59.99"), Some(5999));
        assert_eq!(parse_ticks("1:02.03.45"), Some(372345));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_ticks(""), None);
        assert_eq!(parse_ticks("90"), None);
        assert_eq!(parse_ticks("1.2.3.4.5"), None);
        assert_eq!(parse_ticks("1.xx.00"), None);
        assert_eq!(parse_ticks("1.75.00"), None);
    }

    #[test]
    fn round_trips_formatting() {
        for ticks in [0, 42, 8980, 9000, 372345, 360000] {
            assert_eq!(parse_ticks(&format_ticks(ticks)), Some(ticks));
        }
    }
}
