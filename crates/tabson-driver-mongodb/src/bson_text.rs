//! Canonical text rendering of BSON values
//!
//! Scalars render to their natural text, dates to ISO-8601 in UTC, and
//! composite values to relaxed extended JSON with `", "` and `": "`
//! separators, e.g. `[5, 6, 7]` and `{"c": 5}`.

use bson::Bson;
use serde::Serialize;
use std::io;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Text of a value, or `None` for null, undefined and binary values
pub fn to_text(value: &Bson) -> Option<String> {
    match value {
        Bson::Null | Bson::Undefined | Bson::Binary(_) => None,
        Bson::String(s) | Bson::Symbol(s) | Bson::JavaScriptCode(s) => Some(s.clone()),
        Bson::Double(v) => Some(format_double(*v)),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        Bson::Decimal128(v) => Some(v.to_string()),
        Bson::Boolean(v) => Some(v.to_string()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::DateTime(dt) => Some(format_date(*dt)),
        _ => Some(to_extended_json(value)),
    }
}

/// Doubles always keep a fractional part: `2.4`, `1.0`
pub fn format_double(v: f64) -> String {
    format!("{:?}", v)
}

/// First instant of the Gregorian calendar, 1582-10-15T00:00:00Z
pub const GREGORIAN_CUTOVER_MILLIS: i64 = -12_219_292_800_000;

const MILLIS_PER_DAY: i64 = 86_400_000;
/// Julian day number of 1970-01-01
const UNIX_EPOCH_JDN: i64 = 2_440_588;

/// ISO-8601 text of a date in UTC
///
/// Instants before the Gregorian cutover use the Julian calendar, so
/// `-44364244526000` renders as `0564-02-23T22:44:34.000Z`.
pub fn format_date(dt: bson::DateTime) -> String {
    let millis = dt.timestamp_millis();
    if millis < GREGORIAN_CUTOVER_MILLIS {
        return format_julian(millis);
    }
    match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis) {
        Some(utc) => utc.format(DATE_FORMAT).to_string(),
        None => dt.to_string(),
    }
}

fn format_julian(millis: i64) -> String {
    let days = millis.div_euclid(MILLIS_PER_DAY);
    let of_day = millis.rem_euclid(MILLIS_PER_DAY);
    let (year, month, day) = julian_from_jdn(days + UNIX_EPOCH_JDN);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        of_day / 3_600_000,
        of_day / 60_000 % 60,
        of_day / 1_000 % 60,
        of_day % 1_000
    )
}

/// Julian calendar date of a Julian day number
fn julian_from_jdn(jdn: i64) -> (i64, i64, i64) {
    let c = jdn + 32_082;
    let d = (4 * c + 3).div_euclid(1_461);
    let e = c - (1_461 * d).div_euclid(4);
    let m = (5 * e + 2).div_euclid(153);
    let day = e - (153 * m + 2).div_euclid(5) + 1;
    let month = m + 3 - 12 * m.div_euclid(10);
    let year = d - 4_800 + m.div_euclid(10);
    (year, month, day)
}

/// Relaxed extended JSON of any value
pub fn to_extended_json(value: &Bson) -> String {
    let json = value.clone().into_relaxed_extjson();
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if json.serialize(&mut ser).is_err() {
        return json.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| json.to_string())
}

/// Compact JSON with a space after every separator
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
