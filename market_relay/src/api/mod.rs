// @file: market_relay/src/api/mod.rs
// @description: Outward surfaces: the REST router and the subscriber WebSocket server.
// @author: LAS.

pub mod rest;
pub mod ws_server;
