// @file: market_relay/src/core/models.rs
// @description: Canonical candle, trade and paging structures shared by every exchange connector.
// @author: LAS.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


//
// EXCHANGE & MARKET TYPES
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Exchange {
    Binance,
    ByBit,
    #[serde(rename = "MEXC")]
    Mexc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MarketType {
    Spot,
    Futures,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::ByBit => "ByBit",
            Exchange::Mexc => "MEXC",
        }
    }
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Spot => "Spot",
            MarketType::Futures => "Futures",
        }
    }

    /// Outbound event name used when relaying trades of this market.
    pub fn trade_event_name(&self) -> &'static str {
        match self {
            MarketType::Spot => "spot_trade_update",
            MarketType::Futures => "futures_trade_update",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::ByBit),
            "mexc" => Ok(Exchange::Mexc),
            other => Err(format!("unknown exchange '{}'", other)),
        }
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(MarketType::Spot),
            "futures" | "future" | "linear" => Ok(MarketType::Futures),
            other => Err(format!("unknown market '{}'", other)),
        }
    }
}


//
// HISTORICAL CANDLES
//

/// One normalized kline. Prices and volume stay as the decimal strings upstream sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    #[serde(rename = "createdAt")]
    pub open_time: DateTime<Utc>,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

/// Raw query parameters as they arrive on the REST surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleParams {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// Validated request. Only constructed through `CandleQuery::from_params`.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleQuery {
    pub symbol: String,
    pub interval: String,
    pub limit: u32,
    pub page: usize,
    pub page_size: usize,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryDefaults {
    pub limit: u32,
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self { limit: 100, page: 1, page_size: 10 }
    }
}


//
// PAGING
//

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub data: Vec<T>,
}

/// Body returned by every OHLCV route.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandlePage {
    pub exchange: Exchange,
    pub market: MarketType,
    #[serde(flatten)]
    pub page: PageResult<Candle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
}


//
// LIVE TRADES
//

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TradeEvent {
    pub exchange: Exchange,
    pub market: MarketType,
    pub symbol: String,
    pub price: String,
    pub volume: String,
    pub timestamp: DateTime<Utc>,
}

/// One configured live feed: which exchange, which market, which instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub exchange: Exchange,
    pub market: MarketType,
    pub symbol: String,
}

impl fmt::Display for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}_{}", self.exchange, self.market, self.symbol)
    }
}

impl FromStr for StreamTarget {
    type Err = String;

    // Format: EXCHANGE:MARKET:SYMBOL, e.g. "binance:spot:BTCUSDT"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(format!("stream target '{}' is not EXCHANGE:MARKET:SYMBOL", s));
        }

        let exchange: Exchange = parts[0].parse()?;
        let market: MarketType = parts[1].parse()?;
        let symbol: String = parts[2].trim().to_uppercase();

        if symbol.is_empty() {
            return Err(format!("stream target '{}' has an empty symbol", s));
        }
        if exchange == Exchange::Mexc {
            return Err(format!("no live trade feed available for {}", exchange));
        }

        Ok(StreamTarget { exchange, market, symbol })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closing | ConnectionState::Closed)
    }
}
