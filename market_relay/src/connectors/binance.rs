// @file: market_relay/src/connectors/binance.rs
// @description: Binance connectors: kline history over REST (Spot + USD-M Futures) and the raw trade stream.
// @author: LAS.

pub mod binance_rest;
pub mod binance_stream;

pub use binance_rest::BinanceKlines;
pub use binance_stream::BinanceTradeFeed;
