// @file: market_relay/src/connectors/wire.rs
// @description: Small decoding helpers shared by the exchange wire formats.

use crate::core::error::RelayError;
use crate::core::models::Candle;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;


/// Decimal field as text, whether upstream sent a JSON string or a number.
pub fn decimal_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer field that some exchanges send quoted.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

pub fn malformed(label: &str, detail: &str) -> RelayError {
    RelayError::UpstreamException(format!("{} returned an unexpected kline payload: {}", label, detail))
}

/// Rows shaped `[openTimeMs, open, high, low, close, volume, ...]`.
pub fn positional_rows(label: &str, rows: &[Value]) -> Result<Vec<Candle>, RelayError> {
    let mut candles: Vec<Candle> = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let arr = row
            .as_array()
            .ok_or_else(|| malformed(label, &format!("row {} is not an array", idx)))?;

        if arr.len() < 6 {
            return Err(malformed(label, &format!("row {} has {} fields", idx, arr.len())));
        }

        let open_time = integer(&arr[0])
            .and_then(millis_to_utc)
            .ok_or_else(|| malformed(label, &format!("row {} has no open time", idx)))?;

        let field = |i: usize| -> Result<String, RelayError> {
            decimal_text(&arr[i]).ok_or_else(|| malformed(label, &format!("row {} field {} is not a decimal", idx, i)))
        };

        candles.push(Candle {
            open_time,
            open: field(1)?,
            high: field(2)?,
            low: field(3)?,
            close: field(4)?,
            volume: field(5)?,
        });
    }

    Ok(candles)
}
