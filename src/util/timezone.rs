use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Hour of day (0-23) of `time` on the wall clock of `tz`.
pub fn local_hour(time: OffsetDateTime, tz: Tz) -> u8 {
    // chrono hours are always < 24
    localized_datetime(time, tz).hour() as u8
}
