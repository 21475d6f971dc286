// @file: market_relay/src/tests/support.rs
// @description: Hand-written mocks shared by the test modules: a canned upstream client and a scripted feed socket.
// @author: LAS.

use crate::core::error::{FeedError, UpstreamError};
use crate::core::interfaces::{FeedConnector, FeedSocket, TradeFeed, UpstreamClient};
use crate::core::models::{CandleParams, Exchange, StreamTarget, TradeEvent};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;


//
// UPSTREAM HTTP
//

/// Answers every GET with the same body and records what was asked.
pub struct StaticClient {
    body: Value,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl StaticClient {
    pub fn new(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for StaticClient {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        Ok(self.body.clone())
    }
}

/// `[openTime, open, high, low, close, volume, closeTime]` as Binance/MEXC spot send it.
pub fn kline_row(open_ms: i64, close: &str) -> Value {
    json!([open_ms, "1.00", "2.00", "0.50", close, "10.0", open_ms + 59_999])
}

pub fn params(pairs: &[(&str, &str)]) -> CandleParams {
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    serde_json::from_value(Value::Object(map)).unwrap()
}


//
// LIVE FEED
//

/// Everything the scripted sockets observed, shared with the test body.
#[derive(Default)]
pub struct FeedLog {
    pub connects: Mutex<Vec<Instant>>,
    pub dropped_at: Mutex<Vec<Instant>>,
    pub sent: Mutex<Vec<String>>,
    pub closed: AtomicUsize,
}

impl FeedLog {
    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

/// How each scripted socket behaves once its frames are used up.
#[derive(Clone, Copy, PartialEq)]
pub enum AfterFrames {
    /// Report a server-side close.
    Drop,
    /// Stay open until the ingestor closes it.
    Hold,
    /// Refuse the connection outright.
    Refuse,
}

pub struct ScriptedConnector {
    pub log: Arc<FeedLog>,
    pub frames: Vec<String>,
    pub after: AfterFrames,
}

impl ScriptedConnector {
    pub fn new(frames: &[&str], after: AfterFrames) -> (Arc<Self>, Arc<FeedLog>) {
        let log: Arc<FeedLog> = Arc::new(FeedLog::default());
        let connector = Arc::new(Self {
            log: log.clone(),
            frames: frames.iter().map(|f| f.to_string()).collect(),
            after,
        });
        (connector, log)
    }
}

#[async_trait]
impl FeedConnector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn FeedSocket>, FeedError> {
        self.log.connects.lock().unwrap().push(Instant::now());
        if self.after == AfterFrames::Refuse {
            return Err(FeedError::Connect("connection refused".to_string()));
        }
        Ok(Box::new(ScriptedSocket {
            frames: self.frames.iter().cloned().collect(),
            hold_open: self.after == AfterFrames::Hold,
            log: self.log.clone(),
        }))
    }
}

struct ScriptedSocket {
    frames: VecDeque<String>,
    hold_open: bool,
    log: Arc<FeedLog>,
}

#[async_trait]
impl FeedSocket for ScriptedSocket {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.log.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, FeedError>> {
        if let Some(frame) = self.frames.pop_front() {
            return Some(Ok(frame));
        }
        if self.hold_open {
            std::future::pending::<()>().await;
        }
        self.log.dropped_at.lock().unwrap().push(Instant::now());
        None
    }

    async fn close(&mut self) {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Treats the literal frame "trade" as one trade at 2024-01-01T00:00:00Z.
pub struct EchoFeed;

impl TradeFeed for EchoFeed {
    fn endpoint(&self, target: &StreamTarget) -> String {
        format!("ws://mock/{}", target.symbol.to_lowercase())
    }

    fn subscribe_frame(&self, target: &StreamTarget) -> Option<String> {
        Some(format!("subscribe:{}", target.symbol))
    }

    fn parse_frame(&self, target: &StreamTarget, text: &str) -> Vec<TradeEvent> {
        if text != "trade" {
            return Vec::new();
        }
        vec![TradeEvent {
            exchange: Exchange::Binance,
            market: target.market,
            symbol: target.symbol.clone(),
            price: "42000.10".to_string(),
            volume: "0.5".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }]
    }
}
