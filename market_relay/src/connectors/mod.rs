// @file: market_relay/src/connectors/mod.rs
// @description: Factory module building kline adapters and spawning trade feeds per Exchange/MarketType.
// @author: LAS.

pub mod binance;
pub mod bybit;
pub mod http_client;
pub mod mexc;
pub mod rest_dispatch;
pub mod wire;
pub mod ws_transport;

use crate::core::broadcaster::Broadcaster;
use crate::core::ingestor::{IngestorHandle, StreamIngestor};
use crate::core::interfaces::{FeedConnector, KlineSource, TradeFeed, UpstreamClient};
use crate::core::models::{Exchange, MarketType, StreamTarget};
use crate::core::retry::RetryPolicy;
use crate::utils::config::AppConfig;
use binance::{BinanceKlines, BinanceTradeFeed};
use bybit::{ByBitKlines, ByBitTradeFeed};
use mexc::{MexcFuturesKlines, MexcSpotKlines};
use rest_dispatch::{AdapterSet, ExchangeAdapter};
use std::sync::Arc;


//
// REST FACTORY
//

pub fn build_adapters(config: &AppConfig, client: Arc<dyn UpstreamClient>) -> AdapterSet {
    let sources: Vec<Box<dyn KlineSource>> = vec![
        Box::new(BinanceKlines::new(MarketType::Spot, config.binance_spot_api_url.clone())),
        Box::new(BinanceKlines::new(MarketType::Futures, config.binance_futures_api_url.clone())),
        Box::new(ByBitKlines::new(MarketType::Spot, config.bybit_api_url.clone())),
        Box::new(ByBitKlines::new(MarketType::Futures, config.bybit_api_url.clone())),
        Box::new(MexcSpotKlines::new(config.mexc_spot_api_url.clone())),
        Box::new(MexcFuturesKlines::new(config.mexc_futures_api_url.clone())),
    ];

    let retry = RetryPolicy::new(config.retry_max_attempts, config.retry_initial_delay());

    let adapters: Vec<ExchangeAdapter> = sources
        .into_iter()
        .map(|source| {
            ExchangeAdapter::new(source, client.clone())
                .with_retry(retry)
                .with_range_mode(config.range_mode)
                .with_defaults(config.query_defaults())
        })
        .collect();

    AdapterSet::new(adapters)
}


//
// STREAM FACTORY
//

/// Wire format for the target's exchange family. MEXC has none.
pub fn trade_feed_for(exchange: Exchange, config: &AppConfig) -> Option<Arc<dyn TradeFeed>> {
    match exchange {
        Exchange::Binance => Some(Arc::new(BinanceTradeFeed::new(
            config.binance_spot_ws_url.clone(),
            config.binance_futures_ws_url.clone(),
        ))),
        Exchange::ByBit => Some(Arc::new(ByBitTradeFeed::new(config.bybit_ws_url.clone()))),
        Exchange::Mexc => None,
    }
}

pub fn spawn_ingestor(
    target: StreamTarget,
    config: &AppConfig,
    connector: Arc<dyn FeedConnector>,
    broadcaster: Broadcaster,
) -> Option<IngestorHandle> {
    let feed: Arc<dyn TradeFeed> = trade_feed_for(target.exchange, config)?;

    let handle = StreamIngestor::new(target, feed, connector, broadcaster)
        .with_reconnect_delay(config.reconnect_delay())
        .spawn();

    Some(handle)
}
