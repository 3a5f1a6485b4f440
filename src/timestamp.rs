//! Conversions between epoch milliseconds, the storage format for points in
//! time, and [OffsetDateTime].

use time::OffsetDateTime;

use crate::Error;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Convert `date_time` to milliseconds since the Unix epoch, truncating sub-millisecond precision.
pub fn to_epoch_millis(date_time: OffsetDateTime) -> EpochMillis {
    (date_time.unix_timestamp_nanos() / NANOS_PER_MILLI) as EpochMillis
}

/// Convert milliseconds since the Unix epoch to a UTC date-time.
///
/// # Errors
/// Returns [Error::InvalidDate] if `millis` is outside the range supported by [OffsetDateTime].
pub fn from_epoch_millis(millis: EpochMillis) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * NANOS_PER_MILLI)
        .map_err(|error| Error::InvalidDate(format!("{millis}: {error}")))
}
