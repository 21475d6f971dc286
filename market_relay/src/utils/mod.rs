// @file: market_relay/src/utils/mod.rs
// @description: Process-level helpers.
// @author: LAS.

pub mod config;
