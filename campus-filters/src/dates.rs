use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

/// Zone used to interpret dates submitted without offset information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// The server's system zone.
    #[default]
    System,
    Fixed(FixedOffset),
}

impl LocalZone {
    /// Builds a zone from an offset in minutes east of UTC, `None` meaning system local.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .map(LocalZone::Fixed)
            .unwrap_or(LocalZone::System)
    }

    /// Interprets a wall-clock time in this zone and converts it to UTC.
    pub fn to_utc(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            LocalZone::System => resolve(&Local, naive),
            LocalZone::Fixed(offset) => resolve(offset, naive),
        }
    }
}

/// Ambiguous wall-clock times take the earlier instant; times inside a gap
/// are read as UTC.
fn resolve<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Which side of a range a submitted value is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Date-only input becomes the start of that day.
    Lower,
    /// Date-only input becomes the last instant of that day.
    Upper,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a submitted date into a UTC bound.
///
/// Input carrying an offset (RFC 3339) is converted directly. Input without
/// one is read as wall-clock time in `zone`. Blank or unparseable text yields
/// `None`, which leaves that side of the range open.
pub fn parse_bound(raw: &str, zone: LocalZone, bound: Bound) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(zone.to_utc(naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let naive = match bound {
            Bound::Lower => date.and_hms_opt(0, 0, 0),
            Bound::Upper => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
        };
        return naive.map(|naive| zone.to_utc(naive));
    }

    debug!(value = %raw, "ignoring unparseable filter date");
    None
}
