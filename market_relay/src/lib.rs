// @file: market_relay/src/lib.rs
// @description: Exposes the relay's modules to the binary and to the test suite.
// @author: LAS.


pub mod api;
pub mod connectors;
pub mod core;
pub mod utils;

#[cfg(test)]
mod tests;
