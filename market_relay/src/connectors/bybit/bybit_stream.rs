// @file: market_relay/src/connectors/bybit/bybit_stream.rs
// @description: ByBit v5 public trade stream. Needs a subscribe frame after open; one frame may carry many trades.
// @author: LAS.

use crate::connectors::wire::{integer, millis_to_utc};
use crate::core::interfaces::TradeFeed;
use crate::core::models::{Exchange, MarketType, StreamTarget, TradeEvent};
use serde::Deserialize;
use serde_json::{json, Value};


pub const BYBIT_WS: &str = "wss://stream.bybit.com";


//
// BYBIT WIRE MODELS
//

#[derive(Deserialize)]
struct ByBitTradeFrame {
    topic: String,
    data: Vec<ByBitTrade>,
}

#[derive(Deserialize)]
struct ByBitTrade {
    #[serde(rename = "s")] symbol: Option<String>,
    #[serde(rename = "p")] price: String,
    #[serde(rename = "v")] volume: String,
    #[serde(rename = "T")] timestamp: Value,
}


//
// FEED
//

pub struct ByBitTradeFeed {
    ws_url: String,
}

impl ByBitTradeFeed {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into() }
    }
}

impl Default for ByBitTradeFeed {
    fn default() -> Self {
        Self::new(BYBIT_WS)
    }
}

impl TradeFeed for ByBitTradeFeed {
    fn endpoint(&self, target: &StreamTarget) -> String {
        let category: &str = match target.market {
            MarketType::Spot => "spot",
            MarketType::Futures => "linear",
        };
        format!("{}/v5/public/{}", self.ws_url.trim_end_matches('/'), category)
    }

    fn subscribe_frame(&self, target: &StreamTarget) -> Option<String> {
        Some(
            json!({
                "op": "subscribe",
                "args": [format!("publicTrade.{}", target.symbol)],
            })
            .to_string(),
        )
    }

    fn parse_frame(&self, target: &StreamTarget, text: &str) -> Vec<TradeEvent> {
        // Subscription acks and pongs have no topic/data and are skipped here
        let frame: ByBitTradeFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(_) => return Vec::new(),
        };
        if !frame.topic.starts_with("publicTrade.") {
            return Vec::new();
        }

        frame
            .data
            .into_iter()
            .filter_map(|trade| {
                let timestamp = integer(&trade.timestamp).and_then(millis_to_utc)?;
                Some(TradeEvent {
                    exchange: Exchange::ByBit,
                    market: target.market,
                    symbol: trade.symbol.unwrap_or_else(|| target.symbol.clone()),
                    price: trade.price,
                    volume: trade.volume,
                    timestamp,
                })
            })
            .collect()
    }
}
