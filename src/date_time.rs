// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `DateTime`, a signed 64-bit count of
//! 100-nanosecond ticks since 1601-01-01 UTC.

use std::{
    fmt,
    io::{Read, Write},
};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::{read_i64, write_i64, BinaryCodable, DecodingOptions, EncodingResult};

pub type DateTimeUtc = chrono::DateTime<Utc>;

const NANOS_PER_TICK: i64 = 100;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 1601-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;
/// Ticks at 9999-12-31T23:59:59Z, the protocol's "end of time".
const ENDTIMES_TICKS: i64 = 2_650_467_743_990_000_000;

/// A date/time value held as raw wire ticks. Values outside the protocol
/// range [1601-01-01, 9999-12-31] clamp to epoch and endtimes respectively,
/// and `i64::MAX` on the wire means endtimes.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash, Default)]
pub struct DateTime {
    ticks: i64,
}

impl BinaryCodable for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_i64(stream, self.ticks)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(DateTime::from(read_i64(stream)?))
    }
}

impl From<i64> for DateTime {
    fn from(ticks: i64) -> Self {
        if ticks == i64::MAX || ticks > ENDTIMES_TICKS {
            Self::endtimes()
        } else if ticks < 0 {
            Self::epoch()
        } else {
            DateTime { ticks }
        }
    }
}

impl From<DateTimeUtc> for DateTime {
    fn from(value: DateTimeUtc) -> Self {
        // Sub-tick precision is truncated, the wire cannot carry it.
        let ticks = UNIX_EPOCH_TICKS
            .saturating_add(value.timestamp().saturating_mul(TICKS_PER_SECOND))
            .saturating_add(i64::from(value.timestamp_subsec_nanos()) / NANOS_PER_TICK);
        DateTime::from(ticks)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_chrono().to_rfc3339())
    }
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.ticks.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<DateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(DateTime::from(i64::deserialize(deserializer)?))
    }
}

impl DateTime {
    /// 1601-01-01 00:00:00 UTC, tick zero.
    pub fn epoch() -> DateTime {
        DateTime { ticks: 0 }
    }

    /// 9999-12-31 23:59:59 UTC, the latest representable time.
    pub fn endtimes() -> DateTime {
        DateTime {
            ticks: ENDTIMES_TICKS,
        }
    }

    /// The current time, truncated to tick precision.
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// Constructs a date time from calendar fields, clamping values outside
    /// the protocol range.
    pub fn ymd_hms(
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
    ) -> DateTime {
        match Utc
            .with_ymd_and_hms(
                i32::from(year),
                u32::from(month),
                u32::from(day),
                u32::from(hour),
                u32::from(minute),
                u32::from(second),
            )
            .single()
        {
            Some(dt) => DateTime::from(dt),
            None => {
                warn!(
                    "Invalid date components {}-{}-{} {}:{}:{}, using epoch",
                    year, month, day, hour, minute, second
                );
                DateTime::epoch()
            }
        }
    }

    /// The raw tick count.
    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn is_epoch(&self) -> bool {
        self.ticks == 0
    }

    pub fn is_endtimes(&self) -> bool {
        self.ticks == ENDTIMES_TICKS
    }

    /// The value as a chrono UTC date time.
    pub fn as_chrono(&self) -> DateTimeUtc {
        let rel = self.ticks - UNIX_EPOCH_TICKS;
        let secs = rel.div_euclid(TICKS_PER_SECOND);
        let nanos = (rel.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
        Utc.timestamp_opt(secs, nanos)
            .single()
            .unwrap_or(DateTimeUtc::UNIX_EPOCH)
    }
}

#[test]
fn date_time_clamps() {
    assert_eq!(DateTime::from(-5), DateTime::epoch());
    assert_eq!(DateTime::from(i64::MAX), DateTime::endtimes());
    assert_eq!(DateTime::ymd_hms(1599, 1, 1, 0, 0, 0), DateTime::epoch());
    assert_eq!(
        DateTime::from(DateTime::endtimes().ticks() + 1),
        DateTime::endtimes()
    );
}

#[test]
fn date_time_chrono_round_trip() {
    let dt = DateTime::ymd_hms(2024, 7, 14, 12, 30, 5);
    assert_eq!(DateTime::from(dt.as_chrono()), dt);
    assert_eq!(dt.as_chrono().timestamp(), 1_720_960_205);
}
