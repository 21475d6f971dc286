// @file: market_relay/src/core/interfaces.rs
// @description: Traits at the I/O seams: upstream HTTP, per-exchange kline/trade formats, and feed sockets.
// @author: LAS.

use crate::core::error::{FeedError, RelayError, UpstreamError};
use crate::core::models::{Candle, CandleQuery, Exchange, MarketType, StreamTarget, TradeEvent};
use async_trait::async_trait;
use serde_json::Value;


//
// REST SIDE
//

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    // #1. Perform one GET and decode the JSON body. Non-2xx answers are errors.
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError>;
}

/// Exchange-specific half of an adapter: where to fetch and how to read what comes back.
pub trait KlineSource: Send + Sync {
    fn exchange(&self) -> Exchange;

    fn market(&self) -> MarketType;

    /// Largest `limit` the upstream endpoint accepts.
    fn max_limit(&self) -> u32;

    fn build_url(&self, query: &CandleQuery) -> Result<String, RelayError>;

    // #2. Chance to flag failures hidden in an otherwise successful envelope
    // (e.g. an error code inside a 200 body). Runs inside the retried call.
    fn inspect(&self, _body: &Value) -> Result<(), UpstreamError> {
        Ok(())
    }

    // #3. Re-classify a failed call using exchange knowledge (e.g. a rate-limit code in the body).
    fn classify(&self, err: UpstreamError) -> UpstreamError {
        err
    }

    fn parse_candles(&self, body: Value) -> Result<Vec<Candle>, RelayError>;
}


//
// STREAM SIDE
//

/// Exchange-family wire format for live trades.
pub trait TradeFeed: Send + Sync {
    fn endpoint(&self, target: &StreamTarget) -> String;

    /// Frame to send right after the socket opens, if the exchange wants one.
    fn subscribe_frame(&self, _target: &StreamTarget) -> Option<String> {
        None
    }

    /// Frames that do not look like trades yield an empty list.
    fn parse_frame(&self, target: &StreamTarget, text: &str) -> Vec<TradeEvent>;
}

#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedSocket>, FeedError>;
}

#[async_trait]
pub trait FeedSocket: Send {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError>;

    /// Next text frame. `None` once the peer has closed the socket.
    async fn next_text(&mut self) -> Option<Result<String, FeedError>>;

    async fn close(&mut self);
}
