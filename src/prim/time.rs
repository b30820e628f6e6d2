//! UTCTime and GeneralizedTime
//!
//! Both types are encoded as ASCII digit strings:
//!
//! * UTCTime: `YYMMDDhhmm[ss]` followed by `Z` or `+hhmm`/`-hhmm`, where
//!   `YY` below 50 denotes 20YY and any other value 19YY;
//! * GeneralizedTime: `YYYYMMDDhh[mm[ss[.f+]]]` optionally followed by `Z` or
//!   an offset, local time being denoted by the absence of either.
//!
//! Under DER only the canonical forms are produced and accepted: UTC
//! (`Z`), seconds always present, and for GeneralizedTime a fractional part
//! separated by `.` with no trailing zeros, omitted when zero. Encoding
//! under DER converts offset times to UTC.
//!
//! Calendar validity is checked through `chrono`; fractional seconds are
//! supported to nanosecond precision.

use std::hash::{Hash, Hasher};

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::error::{CodecError, CodecResult};
use crate::mode::Mode;
use crate::parse::Parser;
use crate::tag::number;

/// Time zone designation of a time value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    Utc,
    Offset(FixedOffset),
    /// No designation (GeneralizedTime only)
    Local,
}

impl Zone {
    fn to_utc(self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Zone::Utc => Some(local),
            Zone::Offset(offset) => {
                local.checked_sub_signed(TimeDelta::try_seconds(i64::from(offset.local_minus_utc()))?)
            }
            Zone::Local => None,
        }
    }
}

macro_rules! time_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            local: NaiveDateTime,
            zone: Zone,
        }

        impl $name {
            pub const fn new(local: NaiveDateTime, zone: Zone) -> Self {
                Self { local, zone }
            }

            pub const fn from_utc(utc: NaiveDateTime) -> Self {
                Self::new(utc, Zone::Utc)
            }

            /// Date and time as written, in the designated zone
            pub const fn local(&self) -> NaiveDateTime {
                self.local
            }

            pub const fn zone(&self) -> Zone {
                self.zone
            }

            /// The instant denoted, if the zone is known
            pub fn to_utc(&self) -> Option<NaiveDateTime> {
                self.zone.to_utc(self.local)
            }
        }

        /// Values with a known zone compare as instants
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                match (self.to_utc(), other.to_utc()) {
                    (Some(a), Some(b)) => a == b,
                    _ => self.local == other.local && self.zone == other.zone,
                }
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                match self.to_utc() {
                    Some(utc) => utc.hash(state),
                    None => {
                        self.local.hash(state);
                        self.zone.hash(state);
                    }
                }
            }
        }
    };
}

time_type!(
    /// UTCTime value; years are limited to 1950 through 2049 and seconds are whole
    UtcTime
);
time_type!(
    /// GeneralizedTime value
    GeneralizedTime
);

/// Cursor over the ASCII content of a time value
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_digit(&self) -> bool {
        self.peek().is_some_and(|b| b.is_ascii_digit())
    }

    fn digits(&mut self, n: usize) -> Option<u32> {
        let chunk = self.bytes.get(self.pos..self.pos + n)?;
        let mut value = 0;
        for &b in chunk {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + u32::from(b - b'0');
        }
        self.pos += n;
        Some(value)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// Parses `Z`, `+hhmm` or `-hhmm`, or nothing at all
    fn zone(&mut self) -> Option<Option<Zone>> {
        if self.eat(b'Z') {
            return Some(Some(Zone::Utc));
        }
        let sign = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Some(None),
        };
        self.pos += 1;
        let (hh, mm) = (self.digits(2)?, self.digits(2)?);
        if hh > 23 || mm > 59 {
            return None;
        }
        let seconds = i32::try_from(hh * 3600 + mm * 60).ok()?;
        FixedOffset::east_opt(sign * seconds).map(|off| Some(Zone::Offset(off)))
    }
}

fn datetime(year: i32, month: u32, day: u32, hms: (u32, u32, u32), nano: u32) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_nano_opt(hms.0, hms.1, hms.2, nano)?;
    Some(NaiveDateTime::new(date, time))
}

/// Resolves the date-time and zone to write under mode `M`
fn normalized<M: Mode>(local: NaiveDateTime, zone: Zone, what: &'static str) -> CodecResult<(NaiveDateTime, Zone)> {
    if !M::IS_DER {
        return Ok((local, zone));
    }
    match zone.to_utc(local) {
        Some(utc) => Ok((utc, Zone::Utc)),
        None if zone == Zone::Local => Err(CodecError::bad_value(what, "local time has no DER encoding")),
        None => Err(CodecError::bad_value(what, "offset conversion out of range")),
    }
}

fn zone_suffix(zone: Zone, what: &'static str) -> CodecResult<String> {
    match zone {
        Zone::Utc => Ok("Z".to_owned()),
        Zone::Local => Ok(String::new()),
        Zone::Offset(offset) => {
            let seconds = offset.local_minus_utc();
            if seconds % 60 != 0 {
                return Err(CodecError::bad_value(what, "offset is not a whole number of minutes"));
            }
            let sign = if seconds < 0 { '-' } else { '+' };
            let (hh, mm) = num_integer::div_rem(seconds.abs() / 60, 60);
            Ok(format!("{sign}{hh:02}{mm:02}"))
        }
    }
}

fn hms(t: &NaiveDateTime) -> String {
    format!("{:02}{:02}{:02}", t.hour(), t.minute(), t.second())
}

super::universal!(UtcTime, primitive number::UTC_TIME);

impl Encode for UtcTime {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        if self.zone == Zone::Local {
            return Err(CodecError::bad_value("UTCTime", "time zone designation is required"));
        }
        let (t, zone) = normalized::<M>(self.local, self.zone, "UTCTime")?;
        if t.nanosecond() != 0 {
            return Err(CodecError::bad_value("UTCTime", "fractional seconds"));
        }
        if !(1950..=2049).contains(&t.year()) {
            return Err(CodecError::bad_value("UTCTime", "year outside 1950..=2049"));
        }
        let text = format!(
            "{:02}{:02}{:02}{}{}",
            t.year() % 100,
            t.month(),
            t.day(),
            hms(&t),
            zone_suffix(zone, "UTCTime")?
        );
        Ok(buf.push_all(text.as_bytes()))
    }
}

impl Decode for UtcTime {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        let malformed = CodecError::bad_content(offset, "UTCTime", "malformed time string");
        let mut c = Cursor::new(p.consume_rest()?);
        let parsed = (|| {
            let (yy, month, day) = (c.digits(2)?, c.digits(2)?, c.digits(2)?);
            let (hour, minute) = (c.digits(2)?, c.digits(2)?);
            let second = if c.at_digit() {
                c.digits(2)?
            } else if M::IS_DER {
                return None;
            } else {
                0
            };
            let zone = c.zone()??;
            if !c.is_done() || (M::IS_DER && zone != Zone::Utc) {
                return None;
            }
            let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
            Some((year, month, day, (hour, minute, second), zone))
        })()
        .ok_or(malformed)?;
        let (year, month, day, hms, zone) = parsed;
        let local = datetime(year as i32, month, day, hms, 0)
            .ok_or(CodecError::bad_content(offset, "UTCTime", "invalid calendar date or time"))?;
        Ok(Self::new(local, zone))
    }
}

super::universal!(GeneralizedTime, primitive number::GENERALIZED_TIME);

impl Encode for GeneralizedTime {
    fn write_content<M: Mode, U: Target>(&self, buf: &mut U) -> CodecResult<usize> {
        let (t, zone) = normalized::<M>(self.local, self.zone, "GeneralizedTime")?;
        if !(0..=9999).contains(&t.year()) {
            return Err(CodecError::bad_value("GeneralizedTime", "year outside 0..=9999"));
        }
        let nanos = t.nanosecond();
        if nanos >= 1_000_000_000 {
            return Err(CodecError::bad_value("GeneralizedTime", "leap second"));
        }
        let mut text = format!("{:04}{:02}{:02}{}", t.year(), t.month(), t.day(), hms(&t));
        if nanos != 0 {
            let fraction = format!("{nanos:09}");
            text.push('.');
            text.push_str(fraction.trim_end_matches('0'));
        }
        text.push_str(&zone_suffix(zone, "GeneralizedTime")?);
        Ok(buf.push_all(text.as_bytes()))
    }
}

impl Decode for GeneralizedTime {
    fn parse_content<M: Mode, P: Parser>(p: &mut P) -> CodecResult<Self> {
        let offset = p.offset();
        let malformed = CodecError::bad_content(offset, "GeneralizedTime", "malformed time string");
        let mut c = Cursor::new(p.consume_rest()?);
        let parsed = (|| {
            let (year, month, day, hour) = (c.digits(4)?, c.digits(2)?, c.digits(2)?, c.digits(2)?);
            let minute = if c.at_digit() { Some(c.digits(2)?) } else { None };
            let second = match minute {
                Some(_) if c.at_digit() => Some(c.digits(2)?),
                _ => None,
            };
            if M::IS_DER && second.is_none() {
                return None;
            }
            let mut nano = 0;
            let separator = c.peek();
            if second.is_some() && (separator == Some(b'.') || (!M::IS_DER && separator == Some(b','))) {
                c.pos += 1;
                let mut scale = 100_000_000;
                let mut count = 0;
                let mut last = 0;
                while c.at_digit() {
                    if count == 9 {
                        return None;
                    }
                    last = c.digits(1)?;
                    nano += last * scale;
                    scale /= 10;
                    count += 1;
                }
                if count == 0 || (M::IS_DER && last == 0) {
                    return None;
                }
            }
            let zone = c.zone()?.unwrap_or(Zone::Local);
            if !c.is_done() || (M::IS_DER && zone != Zone::Utc) {
                return None;
            }
            let hms = (hour, minute.unwrap_or(0), second.unwrap_or(0));
            Some((year, month, day, hms, nano, zone))
        })()
        .ok_or(malformed)?;
        let (year, month, day, hms, nano, zone) = parsed;
        let local = datetime(year as i32, month, day, hms, nano).ok_or(CodecError::bad_content(
            offset,
            "GeneralizedTime",
            "invalid calendar date or time",
        ))?;
        Ok(Self::new(local, zone))
    }
}
