// @file: market_relay/src/connectors/mexc/mexc_rest.rs
// @description: Kline sources for MEXC Spot (/api/v3/klines) and MEXC contract (/api/v1/contract/kline).
// @author: LAS.

use crate::connectors::wire::{decimal_text, integer, malformed, millis_to_utc, positional_rows};
use crate::core::error::RelayError;
use crate::core::interfaces::KlineSource;
use crate::core::models::{Candle, CandleQuery, Exchange, MarketType};
use serde_json::Value;
use url::Url;


pub const MEXC_SPOT_API: &str = "https://api.mexc.com";
pub const MEXC_FUTURES_API: &str = "https://contract.mexc.com";

/// Returned for every contract-API failure; upstream detail is never forwarded.
pub const SUPPORT_MESSAGE: &str = "please contact support";


//
// SPOT
//

pub struct MexcSpotKlines {
    base_url: String,
}

impl MexcSpotKlines {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

impl KlineSource for MexcSpotKlines {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    fn market(&self) -> MarketType {
        MarketType::Spot
    }

    fn max_limit(&self) -> u32 {
        1000
    }

    fn build_url(&self, query: &CandleQuery) -> Result<String, RelayError> {
        let url = Url::parse_with_params(
            &format!("{}/api/v3/klines", self.base_url.trim_end_matches('/')),
            &[
                ("symbol", query.symbol.clone()),
                ("interval", query.interval.clone()),
                ("limit", query.limit.to_string()),
            ],
        )
        .map_err(|e| RelayError::UpstreamException(format!("MEXC Spot URL error: {}", e)))?;

        Ok(url.into())
    }

    fn parse_candles(&self, body: Value) -> Result<Vec<Candle>, RelayError> {
        let rows = body
            .as_array()
            .ok_or_else(|| malformed("MEXC Spot", "expected an array of klines"))?;

        positional_rows("MEXC Spot", rows)
    }
}


//
// FUTURES (CONTRACT)
//

pub struct MexcFuturesKlines {
    base_url: String,
}

impl MexcFuturesKlines {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

/// Contract API interval names. Unknown intervals go upstream untouched.
pub fn contract_interval(interval: &str) -> &str {
    match interval {
        "1m" => "Min1",
        "5m" => "Min5",
        "15m" => "Min15",
        "30m" => "Min30",
        "1h" => "Min60",
        "4h" => "Hour4",
        "8h" => "Hour8",
        "1d" => "Day1",
        "1w" => "Week1",
        "1M" => "Month1",
        other => other,
    }
}

impl KlineSource for MexcFuturesKlines {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    fn market(&self) -> MarketType {
        MarketType::Futures
    }

    fn max_limit(&self) -> u32 {
        2000
    }

    fn build_url(&self, query: &CandleQuery) -> Result<String, RelayError> {
        // #1. Symbol is a path segment: /api/v1/contract/kline/BTC_USDT
        let mut url = Url::parse(&format!("{}/api/v1/contract/kline", self.base_url.trim_end_matches('/')))
            .map_err(|e| RelayError::UpstreamException(format!("MEXC Futures URL error: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| RelayError::UpstreamException("MEXC Futures URL cannot take a path".to_string()))?
            .push(&query.symbol);

        url.query_pairs_mut()
            .append_pair("interval", contract_interval(&query.interval))
            .append_pair("limit", &query.limit.to_string());

        Ok(url.into())
    }

    fn parse_candles(&self, body: Value) -> Result<Vec<Candle>, RelayError> {
        let support = || RelayError::UpstreamException(SUPPORT_MESSAGE.to_string());

        // #1. Explicit failure flag
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(support());
        }

        // #2. Column arrays; time/open/close are mandatory
        let data = body.get("data").ok_or_else(support)?;
        let column = |name: &str| data.get(name).and_then(Value::as_array);

        let (time, open, close) = match (column("time"), column("open"), column("close")) {
            (Some(t), Some(o), Some(c)) => (t, o, c),
            _ => return Err(support()),
        };
        let high = column("high").ok_or_else(|| malformed("MEXC Futures", "missing high column"))?;
        let low = column("low").ok_or_else(|| malformed("MEXC Futures", "missing low column"))?;
        let vol = column("vol").ok_or_else(|| malformed("MEXC Futures", "missing vol column"))?;

        // #3. Zip columns into candles; times are seconds
        let mut candles: Vec<Candle> = Vec::with_capacity(time.len());
        for (idx, t) in time.iter().enumerate() {
            let cell = |col: &[Value], name: &str| -> Result<String, RelayError> {
                col.get(idx)
                    .and_then(decimal_text)
                    .ok_or_else(|| malformed("MEXC Futures", &format!("{} column has no value at {}", name, idx)))
            };

            let open_time = integer(t)
                .and_then(|secs| secs.checked_mul(1000))
                .and_then(millis_to_utc)
                .ok_or_else(|| malformed("MEXC Futures", &format!("bad time at {}", idx)))?;

            candles.push(Candle {
                open_time,
                open: cell(open, "open")?,
                high: cell(high, "high")?,
                low: cell(low, "low")?,
                close: cell(close, "close")?,
                volume: cell(vol, "vol")?,
            });
        }

        Ok(candles)
    }
}
