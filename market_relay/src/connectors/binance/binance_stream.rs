// @file: market_relay/src/connectors/binance/binance_stream.rs
// @description: Binance raw trade stream (<symbol>@trade). No subscribe handshake, the stream is chosen by URL.
// @author: LAS.

use crate::connectors::wire::millis_to_utc;
use crate::core::interfaces::TradeFeed;
use crate::core::models::{Exchange, MarketType, StreamTarget, TradeEvent};
use serde::Deserialize;


pub const BINANCE_SPOT_WS: &str = "wss://stream.binance.com:9443/ws";
pub const BINANCE_FUTURES_WS: &str = "wss://fstream.binance.com/ws";


//
// BINANCE WIRE MODELS
//

#[derive(Deserialize)]
struct BinanceTradeEvent {
    #[serde(rename = "e")] event_type: String,
    #[serde(rename = "s")] symbol: Option<String>,
    #[serde(rename = "p")] price: String,
    #[serde(rename = "q")] quantity: String,
    #[serde(rename = "T")] timestamp: i64,
}


//
// FEED
//

pub struct BinanceTradeFeed {
    spot_ws_url: String,
    futures_ws_url: String,
}

impl BinanceTradeFeed {
    pub fn new(spot_ws_url: impl Into<String>, futures_ws_url: impl Into<String>) -> Self {
        Self {
            spot_ws_url: spot_ws_url.into(),
            futures_ws_url: futures_ws_url.into(),
        }
    }
}

impl Default for BinanceTradeFeed {
    fn default() -> Self {
        Self::new(BINANCE_SPOT_WS, BINANCE_FUTURES_WS)
    }
}

impl TradeFeed for BinanceTradeFeed {
    fn endpoint(&self, target: &StreamTarget) -> String {
        let base: &str = match target.market {
            MarketType::Spot => &self.spot_ws_url,
            MarketType::Futures => &self.futures_ws_url,
        };
        format!("{}/{}@trade", base.trim_end_matches('/'), target.symbol.to_lowercase())
    }

    fn parse_frame(&self, target: &StreamTarget, text: &str) -> Vec<TradeEvent> {
        let ev: BinanceTradeEvent = match serde_json::from_str(text) {
            Ok(ev) => ev,
            Err(_) => return Vec::new(),
        };
        if ev.event_type != "trade" {
            return Vec::new();
        }

        let timestamp = match millis_to_utc(ev.timestamp) {
            Some(ts) => ts,
            None => return Vec::new(),
        };

        vec![TradeEvent {
            exchange: Exchange::Binance,
            market: target.market,
            symbol: ev.symbol.unwrap_or_else(|| target.symbol.clone()),
            price: ev.price,
            volume: ev.quantity,
            timestamp,
        }]
    }
}
