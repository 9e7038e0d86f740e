//! Field validation shared by the record types.

use jiff::civil::Time;

/// Longest class a course may describe, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 480;

/// Parse a 24h `H:MM` / `HH:MM` clock time.
pub fn parse_clock_time(value: &str) -> Option<Time> {
    let (hours, minutes) = value.split_once(':')?;

    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return None;
    }

    Time::new(hours.parse().ok()?, minutes.parse().ok()?, 0, 0).ok()
}

/// Loose `local@domain.tld` shape check.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !local.is_empty() && !host.is_empty() && !tld.is_empty() && !domain.contains('@')
}

/// Push `field` onto `missing` when `value` is blank.
pub(crate) fn require(missing: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        missing.push(format!("{field} is required"));
    }
}
