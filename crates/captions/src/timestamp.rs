//! Subtitle timestamps.
//!
//! Instants are carried as whole milliseconds so that parsing and
//! re-emitting a timestamp never drifts.

/// Decimal separator style used when formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `HH:MM:SS.mmm` (WebVTT).
    Period,
    /// `HH:MM:SS,mmm` (SRT).
    Comma,
}

impl Separator {
    fn as_char(self) -> char {
        match self {
            Separator::Period => '.',
            Separator::Comma => ',',
        }
    }
}

/// Parse `H:MM:SS.mmm`, `MM:SS.mmm` or the comma variants into
/// milliseconds. Hours may have any number of digits.
pub fn parse_timestamp(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (clock, fraction) = match raw.find(|c: char| c == '.' || c == ',') {
        Some(pos) => (&raw[..pos], Some(&raw[pos + 1..])),
        None => (raw, None),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (parse_digits(h)?, parse_digits(m)?, parse_digits(s)?),
        [m, s] => (0, parse_digits(m)?, parse_digits(s)?),
        _ => return None,
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let millis = match fraction {
        Some(frac) => {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Scale to exactly three digits.
            let mut digits: String = frac.chars().take(3).collect();
            while digits.len() < 3 {
                digits.push('0');
            }
            digits.parse::<u64>().ok()?
        }
        None => 0,
    };

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

fn parse_digits(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Format milliseconds as `HH:MM:SS<sep>mmm`.
pub fn format_timestamp(ms: u64, separator: Separator) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!(
        "{hours:02}:{minutes:02}:{seconds:02}{}{millis:03}",
        separator.as_char()
    )
}

/// Parse a `start --> end` line, ignoring trailing cue settings.
pub fn parse_time_range(line: &str) -> Option<(u64, u64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_timestamp(left)?;
    let end = parse_timestamp(right.split_whitespace().next()?)?;
    Some((start, end))
}

pub fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Seconds to the nearest millisecond; negative and non-finite inputs
/// map to zero.
pub fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
