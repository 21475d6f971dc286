// @file: market_relay/src/connectors/binance/binance_rest.rs
// @description: Kline source for Binance Spot (/api/v3/klines) and Futures (/fapi/v1/klines).
// @author: LAS.

use crate::connectors::wire::{malformed, positional_rows};
use crate::core::error::RelayError;
use crate::core::interfaces::KlineSource;
use crate::core::models::{Candle, CandleQuery, Exchange, MarketType};
use serde_json::Value;
use url::Url;


pub const BINANCE_SPOT_API: &str = "https://api.binance.com";
pub const BINANCE_FUTURES_API: &str = "https://fapi.binance.com";


pub struct BinanceKlines {
    market: MarketType,
    base_url: String,
}

impl BinanceKlines {
    pub fn new(market: MarketType, base_url: impl Into<String>) -> Self {
        Self { market, base_url: base_url.into() }
    }

    fn label(&self) -> String {
        format!("Binance {}", self.market)
    }
}

impl KlineSource for BinanceKlines {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    fn market(&self) -> MarketType {
        self.market
    }

    fn max_limit(&self) -> u32 {
        match self.market {
            MarketType::Spot => 1000,
            MarketType::Futures => 1500,
        }
    }

    fn build_url(&self, query: &CandleQuery) -> Result<String, RelayError> {
        // #1. Spot and USD-M futures differ only by path
        let endpoint: &str = match self.market {
            MarketType::Spot => "/api/v3/klines",
            MarketType::Futures => "/fapi/v1/klines",
        };

        // #2. Format: {base}{endpoint}?symbol=BTCUSDT&interval=1m&limit=100
        let url = Url::parse_with_params(
            &format!("{}{}", self.base_url.trim_end_matches('/'), endpoint),
            &[
                ("symbol", query.symbol.to_uppercase()),
                ("interval", query.interval.clone()),
                ("limit", query.limit.to_string()),
            ],
        )
        .map_err(|e| RelayError::UpstreamException(format!("{} URL error: {}", self.label(), e)))?;

        Ok(url.into())
    }

    fn parse_candles(&self, body: Value) -> Result<Vec<Candle>, RelayError> {
        // [ [Open Time, Open, High, Low, Close, Volume, Close Time, ...], ... ]
        let rows = body
            .as_array()
            .ok_or_else(|| malformed(&self.label(), "expected an array of klines"))?;

        positional_rows(&self.label(), rows)
    }
}
