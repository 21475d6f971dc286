// @file: market_relay/src/connectors/bybit.rs
// @description: ByBit v5 connectors: kline history over REST and the publicTrade stream.
// @author: LAS.

pub mod bybit_rest;
pub mod bybit_stream;

pub use bybit_rest::ByBitKlines;
pub use bybit_stream::ByBitTradeFeed;

/// retCode ByBit answers with when the caller is being throttled.
pub const BYBIT_RATE_LIMIT_CODE: i64 = 10006;
