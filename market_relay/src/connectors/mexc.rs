// @file: market_relay/src/connectors/mexc.rs
// @description: MEXC connectors. History only, MEXC has no live feed in this relay.
// @author: LAS.

pub mod mexc_rest;

pub use mexc_rest::{MexcFuturesKlines, MexcSpotKlines};
