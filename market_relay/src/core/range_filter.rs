// @file: market_relay/src/core/range_filter.rs
// @description: Inclusive, day-aligned date window applied to candle sequences.
// @author: LAS.

use crate::core::error::RelayError;
use crate::core::models::Candle;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};


//
// BOUNDS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Start,
    End,
}

/// Resolves a `fromDate`/`toDate` parameter into an instant.
/// A bare `YYYY-MM-DD` snaps to the first (Start) or last (End) millisecond of that UTC day;
/// anything with a time component is taken as given.
pub fn parse_bound(raw: &str, side: BoundSide) -> Result<DateTime<Utc>, RelayError> {
    let raw: &str = raw.trim();

    // #1. Calendar date only
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time: Option<NaiveTime> = match side {
            BoundSide::Start => NaiveTime::from_hms_milli_opt(0, 0, 0, 0),
            BoundSide::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999),
        };
        if let Some(t) = time {
            return Ok(Utc.from_utc_datetime(&date.and_time(t)));
        }
    }

    // #2. Full timestamp with offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    // #3. Timestamp without offset, read as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(RelayError::Validation(format!(
        "Invalid date '{}': expected YYYY-MM-DD or a full timestamp",
        raw
    )))
}


//
// FILTER
//

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(from_date: Option<&str>, to_date: Option<&str>) -> Result<Self, RelayError> {
        let from = from_date.map(|s| parse_bound(s, BoundSide::Start)).transpose()?;
        let to = to_date.map(|s| parse_bound(s, BoundSide::End)).transpose()?;
        Ok(Self { from, to })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| *ts >= from) && self.to.map_or(true, |to| *ts <= to)
    }

    /// Keeps order, only drops candles outside the window.
    pub fn filter(&self, candles: Vec<Candle>) -> Vec<Candle> {
        if self.is_unbounded() {
            return candles;
        }
        candles.into_iter().filter(|c| self.contains(&c.open_time)).collect()
    }
}
