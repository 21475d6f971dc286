// @file: market_relay/src/tests/mod.rs
// @description: Test suite entry. Shared mocks live in `support`.
// @author: LAS.

mod support;

mod adapter_tests;
mod broadcaster_tests;
mod ws_server_tests;
