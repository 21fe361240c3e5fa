//! Packed temporal values.
//!
//! Temporal kinds are stored as a signed 64-bit packed integer whose
//! natural ordering matches chronological ordering within a kind. The
//! packed form is what the binary format carries inside opaque
//! payloads and what sort keys and comparisons operate on.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Number of bytes of a packed temporal in the binary format.
pub const PACKED_SIZE: usize = 8;

/// Which temporal kind a packed value belongs to. Datetime and
/// timestamp share a packing; date and time use degenerate forms of
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    Datetime,
    Timestamp,
}

/// A packed temporal value.
///
/// Layout for dates and datetimes: `(((year * 13 + month) << 5 | day)
/// << 17 | hour << 12 | minute << 6 | second) << 24 | microsecond`.
/// Times pack only the time-of-day fields and may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackedTemporal(i64);

impl PackedTemporal {
    pub fn from_raw(raw: i64) -> Self {
        PackedTemporal(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; PACKED_SIZE] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; PACKED_SIZE]) -> Self {
        PackedTemporal(i64::from_le_bytes(bytes))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let ymd = (date.year() as i64 * 13 + date.month() as i64) << 5 | date.day() as i64;
        PackedTemporal(ymd << 41)
    }

    pub fn from_time(time: NaiveTime) -> Self {
        let hms =
            (time.hour() as i64) << 12 | (time.minute() as i64) << 6 | time.second() as i64;
        PackedTemporal(hms << 24 | (time.nanosecond() / 1000) as i64)
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let date = PackedTemporal::from_date(dt.date()).0;
        let time = PackedTemporal::from_time(dt.time()).0;
        PackedTemporal(date | time)
    }

    fn fields(self) -> (i64, u32, u32, u32, u32, u32, u32) {
        let micros = (self.0 & 0xff_ffff) as u32;
        let hms = (self.0 >> 24) & 0x1_ffff;
        let ymd = self.0 >> 41;
        let day = (ymd & 0x1f) as u32;
        let year_month = ymd >> 5;
        let year = year_month / 13;
        let month = (year_month % 13) as u32;
        (
            year,
            month,
            day,
            (hms >> 12) as u32,
            ((hms >> 6) & 0x3f) as u32,
            (hms & 0x3f) as u32,
            micros,
        )
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        let (year, month, day, ..) = self.fields();
        NaiveDate::from_ymd_opt(year as i32, month, day)
    }

    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        let (_, _, _, hour, minute, second, micros) = self.fields();
        self.to_date()?
            .and_hms_micro_opt(hour, minute, second, micros)
    }

    pub fn to_time(self) -> Option<NaiveTime> {
        let abs = PackedTemporal(self.0.abs());
        let (_, _, _, hour, minute, second, micros) = abs.fields();
        NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
    }
}

/// Render a packed temporal the way text serialization prints it.
pub fn format_temporal(kind: TemporalKind, packed: PackedTemporal) -> String {
    match kind {
        TemporalKind::Date => {
            let (year, month, day, ..) = packed.fields();
            format!("{year:04}-{month:02}-{day:02}")
        }
        TemporalKind::Time => {
            let sign = if packed.raw() < 0 { "-" } else { "" };
            let (_, _, _, hour, minute, second, micros) =
                PackedTemporal(packed.raw().abs()).fields();
            format!("{sign}{hour:02}:{minute:02}:{second:02}.{micros:06}")
        }
        TemporalKind::Datetime | TemporalKind::Timestamp => {
            let (year, month, day, hour, minute, second, micros) = packed.fields();
            format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trip() {
        let d = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        let p = PackedTemporal::from_date(d);
        assert_eq!(p.to_date(), Some(d));
        assert_eq!(format_temporal(TemporalKind::Date, p), "2020-02-29");
    }

    #[test]
    fn datetime_round_trip() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123456)
            .unwrap();
        let p = PackedTemporal::from_datetime(dt);
        assert_eq!(p.to_datetime(), Some(dt));
        assert_eq!(
            format_temporal(TemporalKind::Datetime, p),
            "1999-12-31 23:59:58.123456"
        );
    }

    #[test]
    fn packing_orders_chronologically() {
        let a = PackedTemporal::from_datetime(
            NaiveDate::from_ymd_opt(2001, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        let b = PackedTemporal::from_datetime(
            NaiveDate::from_ymd_opt(2001, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 1)
                .unwrap(),
        );
        let c = PackedTemporal::from_datetime(
            NaiveDate::from_ymd_opt(2002, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        assert!(a < b && b < c);
    }

    #[test]
    fn time_of_day_round_trip() {
        let t = NaiveTime::from_hms_micro_opt(13, 5, 7, 42).unwrap();
        let p = PackedTemporal::from_time(t);
        assert_eq!(p.to_time(), Some(t));
        assert_eq!(format_temporal(TemporalKind::Time, p), "13:05:07.000042");
    }

    #[test]
    fn le_bytes_round_trip() {
        let p = PackedTemporal::from_raw(-12345678901234);
        assert_eq!(PackedTemporal::from_le_bytes(p.to_le_bytes()), p);
    }
}
