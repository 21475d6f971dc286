// @file: market_relay/src/core/mod.rs
// @description: Exchange-agnostic domain: models, errors, traits, and the REST/stream building blocks.
// @author: LAS.

pub mod broadcaster;
pub mod error;
pub mod ingestor;
pub mod interfaces;
pub mod models;
pub mod paginator;
pub mod range_filter;
pub mod registry;
pub mod retry;
