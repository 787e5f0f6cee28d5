use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Remote timestamps are shown in this zone unless overridden.
const DEFAULT_DISPLAY_ZONE: Tz = chrono_tz::Europe::Moscow;

/// Modification time of the synced file on one side.
///
/// Failure states are distinct variants so a status label can never show an
/// error string as though it were a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationTime {
    At(DateTime<FixedOffset>),
    FileNotFound,
    Unavailable,
    ParseError,
}

impl ModificationTime {
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            ModificationTime::At(at) => Some(*at),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ModificationTime::At(_))
    }
}

impl fmt::Display for ModificationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModificationTime::At(at) => write!(f, "{}", at.format(DISPLAY_FORMAT)),
            ModificationTime::FileNotFound => f.write_str("File not found"),
            ModificationTime::Unavailable => f.write_str("Unavailable"),
            ModificationTime::ParseError => f.write_str("Parse error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneRule {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Zone that remote `Last-Modified` values are converted into: an IANA zone
/// with its full history of offsets, or a plain fixed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayZone {
    name: String,
    rule: ZoneRule,
}

impl DisplayZone {
    pub fn named(tz: Tz) -> Self {
        Self {
            name: tz.name().to_string(),
            rule: ZoneRule::Named(tz),
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            name: format!("UTC{offset}"),
            rule: ZoneRule::Fixed(offset),
        }
    }

    /// Accepts an IANA name (`Europe/Berlin`) or a `+HH:MM` / `-HH:MM` offset.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(offset) = parse_offset(value) {
            return Some(Self::fixed(offset));
        }
        value.parse::<Tz>().ok().map(Self::named)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name plus the offset in force right now, e.g. `Europe/Moscow (+03:00)`.
    pub fn describe(&self) -> String {
        let offset = match self.rule {
            ZoneRule::Named(tz) => Utc::now().with_timezone(&tz).offset().fix(),
            ZoneRule::Fixed(offset) => offset,
        };
        format!("{} ({offset})", self.name)
    }

    /// Parses an HTTP date (`Mon, 01 Jan 2024 12:00:00 GMT`) into this zone.
    /// A trailing `UTC` is accepted in place of `GMT`.
    pub fn parse_http_date(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        let time = match raw.strip_suffix(" UTC") {
            Some(stem) => httpdate::parse_http_date(&format!("{stem} GMT")),
            None => httpdate::parse_http_date(raw),
        }
        .ok()?;
        Some(self.convert(time))
    }

    pub fn convert(&self, time: SystemTime) -> DateTime<FixedOffset> {
        let utc = DateTime::<Utc>::from(time);
        match self.rule {
            ZoneRule::Named(tz) => utc.with_timezone(&tz).fixed_offset(),
            ZoneRule::Fixed(offset) => utc.with_timezone(&offset),
        }
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::named(DEFAULT_DISPLAY_ZONE)
    }
}

fn parse_offset(value: &str) -> Option<FixedOffset> {
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
