// @file: market_relay/src/utils/config.rs
// @description: Layered configuration (defaults -> config file -> APP_* env) for the relay.
// @author: LAS.

use crate::connectors::binance::binance_rest::{BINANCE_FUTURES_API, BINANCE_SPOT_API};
use crate::connectors::binance::binance_stream::{BINANCE_FUTURES_WS, BINANCE_SPOT_WS};
use crate::connectors::bybit::bybit_rest::BYBIT_API;
use crate::connectors::bybit::bybit_stream::BYBIT_WS;
use crate::connectors::mexc::mexc_rest::{MEXC_FUTURES_API, MEXC_SPOT_API};
use crate::connectors::rest_dispatch::RangeMode;
use crate::core::models::{QueryDefaults, StreamTarget};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;


pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "Scheduled maintenance activity is going on, we will be available soon.";


//
// TYPE DEFINITIONS
//

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,

    // Server Settings
    pub http_bind_address: String,
    pub ws_bind_address: String,
    pub broadcast_buffer_size: usize,

    // Maintenance Gate
    pub is_maintenance: bool,
    pub maintenance_message: String,

    // Upstream REST
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub upstream_timeout_secs: u64,
    pub range_mode: RangeMode,
    pub default_limit: u32,
    pub default_page: usize,
    pub default_page_size: usize,

    pub binance_spot_api_url: String,
    pub binance_futures_api_url: String,
    pub bybit_api_url: String,
    pub mexc_spot_api_url: String,
    pub mexc_futures_api_url: String,

    // Upstream Streams
    pub binance_spot_ws_url: String,
    pub binance_futures_ws_url: String,
    pub bybit_ws_url: String,
    pub reconnect_delay_secs: u64,
    pub stream_targets: Vec<String>,
}

impl AppConfig {
    //
    // PUBLIC INTERFACE
    //

    /// Defaults, then an optional `config.*` file, then `APP_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config").required(false))
            .add_source(Self::environment());

        Self::finish(builder)
    }

    /// Defaults plus, when given, one environment source. Never reads the process env or the filesystem on its own.
    pub fn from_sources(env: Option<Environment>) -> Result<Self, ConfigError> {
        let builder = match env {
            Some(env) => Self::defaults()?.add_source(env),
            None => Self::defaults()?,
        };

        Self::finish(builder)
    }

    /// `APP_*` variables; `stream_targets` is comma-separated.
    pub fn environment() -> Environment {
        Environment::with_prefix("APP")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("stream_targets")
    }

    //
    // INTERNAL
    //

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("log_level", "info")?

            // Server Defaults
            .set_default("http_bind_address", "0.0.0.0:3000")?
            .set_default("ws_bind_address", "0.0.0.0:8080")?
            .set_default("broadcast_buffer_size", 1024)?
            .set_default("is_maintenance", false)?
            .set_default("maintenance_message", DEFAULT_MAINTENANCE_MESSAGE)?

            // REST Pipeline
            .set_default("retry_max_attempts", 3)?
            .set_default("retry_initial_delay_ms", 1000)?
            .set_default("upstream_timeout_secs", 30)?
            .set_default("range_mode", "filtered")?
            .set_default("default_limit", 100)?
            .set_default("default_page", 1)?
            .set_default("default_page_size", 10)?

            // Exchange Endpoints
            .set_default("binance_spot_api_url", BINANCE_SPOT_API)?
            .set_default("binance_futures_api_url", BINANCE_FUTURES_API)?
            .set_default("bybit_api_url", BYBIT_API)?
            .set_default("mexc_spot_api_url", MEXC_SPOT_API)?
            .set_default("mexc_futures_api_url", MEXC_FUTURES_API)?
            .set_default("binance_spot_ws_url", BINANCE_SPOT_WS)?
            .set_default("binance_futures_ws_url", BINANCE_FUTURES_WS)?
            .set_default("bybit_ws_url", BYBIT_WS)?
            .set_default("reconnect_delay_secs", 5)?
            .set_default("stream_targets", vec![
                "binance:spot:BTCUSDT",
                "bybit:spot:BTCUSDT",
                "binance:futures:BTCUSDT",
                "bybit:futures:BTCUSDT",
            ])?;

        Ok(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        // Paging and retry knobs must be positive
        let positive: [(&str, u64); 4] = [
            ("default_limit", u64::from(self.default_limit)),
            ("default_page", self.default_page as u64),
            ("default_page_size", self.default_page_size as u64),
            ("retry_max_attempts", u64::from(self.retry_max_attempts)),
        ];

        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Message(format!("{} must be a positive integer", key)));
            }
        }

        Ok(self)
    }

    //
    // ACCESSORS
    //

    pub fn parsed_stream_targets(&self) -> Result<Vec<StreamTarget>, String> {
        self.stream_targets.iter().map(|raw| raw.parse()).collect()
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            limit: self.default_limit,
            page: self.default_page,
            page_size: self.default_page_size,
        }
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
