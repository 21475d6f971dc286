// @file: market_relay/src/connectors/bybit/bybit_rest.rs
// @description: Kline source for ByBit v5 /market/kline (category=spot | linear).
// @author: LAS.

use super::BYBIT_RATE_LIMIT_CODE;
use crate::connectors::wire::{integer, malformed, positional_rows};
use crate::core::error::{RelayError, UpstreamError};
use crate::core::interfaces::KlineSource;
use crate::core::models::{Candle, CandleQuery, Exchange, MarketType};
use serde_json::Value;
use url::Url;


pub const BYBIT_API: &str = "https://api.bybit.com";


pub struct ByBitKlines {
    market: MarketType,
    base_url: String,
}

impl ByBitKlines {
    pub fn new(market: MarketType, base_url: impl Into<String>) -> Self {
        Self { market, base_url: base_url.into() }
    }

    fn label(&self) -> String {
        format!("ByBit {}", self.market)
    }

    fn category(&self) -> &'static str {
        match self.market {
            MarketType::Spot => "spot",
            MarketType::Futures => "linear",
        }
    }
}

fn ret_code(body: &Value) -> Option<i64> {
    body.get("retCode").and_then(integer)
}

impl KlineSource for ByBitKlines {
    fn exchange(&self) -> Exchange {
        Exchange::ByBit
    }

    fn market(&self) -> MarketType {
        self.market
    }

    fn max_limit(&self) -> u32 {
        1000
    }

    fn build_url(&self, query: &CandleQuery) -> Result<String, RelayError> {
        let url = Url::parse_with_params(
            &format!("{}/v5/market/kline", self.base_url.trim_end_matches('/')),
            &[
                ("category", self.category().to_string()),
                ("symbol", query.symbol.clone()),
                ("interval", query.interval.clone()),
                ("limit", query.limit.to_string()),
            ],
        )
        .map_err(|e| RelayError::UpstreamException(format!("{} URL error: {}", self.label(), e)))?;

        Ok(url.into())
    }

    fn inspect(&self, body: &Value) -> Result<(), UpstreamError> {
        // #1. ByBit reports most failures inside a 200 envelope
        match ret_code(body) {
            None | Some(0) => Ok(()),
            Some(code) => {
                let message: String = body
                    .get("retMsg")
                    .and_then(Value::as_str)
                    .unwrap_or("ByBit request failed")
                    .to_string();
                let err = UpstreamError { status: None, body: Some(body.clone()), message, rate_limited: false };
                if code == BYBIT_RATE_LIMIT_CODE {
                    Err(err.rate_limited())
                } else {
                    Err(err)
                }
            }
        }
    }

    fn classify(&self, err: UpstreamError) -> UpstreamError {
        let throttled: bool = err.body.as_ref().and_then(ret_code) == Some(BYBIT_RATE_LIMIT_CODE);
        if throttled { err.rate_limited() } else { err }
    }

    fn parse_candles(&self, body: Value) -> Result<Vec<Candle>, RelayError> {
        // {"retCode":0,"result":{"list":[[start, open, high, low, close, volume, turnover], ...]}}
        let rows = body
            .get("result")
            .and_then(|r| r.get("list"))
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(&self.label(), "missing result.list"))?;

        positional_rows(&self.label(), rows)
    }
}
