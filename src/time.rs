//! Conversions from decoded time values to `chrono` types.
//!
//! UTCTime and GeneralizedTime are carried as character strings on the
//! wire; these helpers parse the standard forms into timezone-aware
//! `chrono` values. Available with the `chrono-conversions` feature and
//! usable in `no_std` environments.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::value::{StringKind, Value, ValueKind};

fn digits(s: &str, n: usize) -> Option<(u32, &str)> {
    if s.len() < n || !s.is_char_boundary(n) {
        return None;
    }
    let (head, tail) = s.split_at(n);
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse::<u32>().ok().map(|v| (v, tail))
}

/// Trailing timezone designator: `Z`, `+HHMM` or `-HHMM`. An absent
/// designator is treated as UTC.
fn parse_zone(s: &str) -> Option<i32> {
    match s.as_bytes() {
        [] | [b'Z'] => Some(0),
        [sign @ (b'+' | b'-'), ..] if s.len() == 5 => {
            let (hours, rest) = digits(&s[1..], 2)?;
            let (minutes, rest) = digits(rest, 2)?;
            if !rest.is_empty() || hours > 23 || minutes > 59 {
                return None;
            }
            let seconds = (hours * 3600 + minutes * 60) as i32;
            Some(if *sign == b'-' { -seconds } else { seconds })
        }
        _ => None,
    }
}

fn build(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millis: u32,
    offset_seconds: i32,
) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, minute, second, millis)?;
    offset.from_local_datetime(&naive).single()
}

/// Parse a UTCTime string: `YYMMDDHHMM[SS](Z|+HHMM|-HHMM)`.
///
/// Two-digit years below 50 land in 2000-2049, the rest in 1950-1999
/// (the X.509 interpretation).
pub fn parse_utc_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let (year, rest) = digits(text, 2)?;
    let (month, rest) = digits(rest, 2)?;
    let (day, rest) = digits(rest, 2)?;
    let (hour, rest) = digits(rest, 2)?;
    let (minute, rest) = digits(rest, 2)?;
    let (second, rest) = match digits(rest, 2) {
        Some((second, rest)) if rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_digit()) => {
            (second, rest)
        }
        _ => (0, rest),
    };

    let year = if year < 50 { 2000 + year as i32 } else { 1900 + year as i32 };
    let offset = parse_zone(rest)?;
    build(year, month, day, hour, minute, second, 0, offset)
}

/// Parse a GeneralizedTime string:
/// `YYYYMMDDHH[MM[SS[.fff]]][Z|+HHMM|-HHMM]`.
pub fn parse_generalized_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let (year, rest) = digits(text, 4)?;
    let (month, rest) = digits(rest, 2)?;
    let (day, rest) = digits(rest, 2)?;
    let (hour, rest) = digits(rest, 2)?;

    let (minute, rest) = match digits(rest, 2) {
        Some((minute, rest)) => (minute, rest),
        None => (0, rest),
    };
    let (second, rest) = match digits(rest, 2) {
        Some((second, rest)) => (second, rest),
        None => (0, rest),
    };

    let (millis, rest) = if let Some(frac) = rest.strip_prefix(['.', ',']) {
        let end = frac
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac.len());
        if end == 0 {
            return None;
        }
        // keep millisecond precision
        let mut millis = 0u32;
        for (i, digit) in frac[..end].bytes().take(3).enumerate() {
            millis += (digit - b'0') as u32 * [100, 10, 1][i];
        }
        (millis, &frac[end..])
    } else {
        (0, rest)
    };

    let offset = parse_zone(rest)?;
    build(year as i32, month, day, hour, minute, second, millis, offset)
}

impl Value {
    /// Convert a decoded UTCTime or GeneralizedTime value to a
    /// `chrono::DateTime`.
    ///
    /// Returns `None` for other value kinds or unparsable time text.
    ///
    /// # Example
    /// ```
    /// # #[cfg(feature = "chrono-conversions")]
    /// # {
    /// use asn1_ber::decode;
    ///
    /// // UTCTime "240615143045Z"
    /// let bytes = [
    ///     0x17, 0x0D, 0x32, 0x34, 0x30, 0x36, 0x31, 0x35,
    ///     0x31, 0x34, 0x33, 0x30, 0x34, 0x35, 0x5A,
    /// ];
    /// let (value, _) = decode(&bytes).unwrap();
    /// let datetime = value.to_chrono().unwrap();
    /// assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45+00:00");
    /// # }
    /// ```
    pub fn to_chrono(&self) -> Option<DateTime<FixedOffset>> {
        match &self.kind {
            ValueKind::CharacterString(StringKind::UtcTime, octets) => {
                parse_utc_time(core::str::from_utf8(octets).ok()?)
            }
            ValueKind::CharacterString(StringKind::GeneralizedTime, octets) => {
                parse_generalized_time(core::str::from_utf8(octets).ok()?)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_time_with_seconds() {
        let datetime = parse_utc_time("240615143045Z").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45+00:00");
    }

    #[test]
    fn test_utc_time_without_seconds() {
        let datetime = parse_utc_time("2406151430Z").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:00+00:00");
    }

    #[test]
    fn test_utc_time_century_split() {
        assert_eq!(parse_utc_time("490101000000Z").unwrap().to_rfc3339(), "2049-01-01T00:00:00+00:00");
        assert_eq!(parse_utc_time("500101000000Z").unwrap().to_rfc3339(), "1950-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_utc_time_offset() {
        let datetime = parse_utc_time("240615143045+0230").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45+02:30");

        let datetime = parse_utc_time("240615143045-0500").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45-05:00");
    }

    #[test]
    fn test_utc_time_invalid() {
        assert!(parse_utc_time("24").is_none());
        assert!(parse_utc_time("241315143045Z").is_none()); // month 13
        assert!(parse_utc_time("240615143045X").is_none());
    }

    #[test]
    fn test_generalized_time_full() {
        let datetime = parse_generalized_time("20240615143045Z").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45+00:00");
    }

    #[test]
    fn test_generalized_time_fraction() {
        let datetime = parse_generalized_time("20240615143045.5Z").unwrap();
        assert_eq!(datetime.timestamp_subsec_millis(), 500);

        let datetime = parse_generalized_time("20240615143045.123Z").unwrap();
        assert_eq!(datetime.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_generalized_time_hour_only() {
        let datetime = parse_generalized_time("2024061514Z").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:00:00+00:00");
    }

    #[test]
    fn test_generalized_time_no_zone_is_utc() {
        let datetime = parse_generalized_time("20240615143045").unwrap();
        assert_eq!(datetime.to_rfc3339(), "2024-06-15T14:30:45+00:00");
    }
}
