// @file: market_relay/src/connectors/rest_dispatch.rs
// @description: Shared fetch pipeline (validate -> retry -> normalize -> filter -> page) and route lookup.
// @author: LAS.

use crate::core::error::{RelayError, UpstreamError};
use crate::core::interfaces::{KlineSource, UpstreamClient};
use crate::core::models::{Candle, CandlePage, CandleParams, CandleQuery, Exchange, MarketType, QueryDefaults};
use crate::core::paginator::paginate;
use crate::core::range_filter::DateRange;
use crate::core::retry::RetryPolicy;
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;


//
// RANGE MODE
//

/// Whether `fromDate`/`toDate` are honoured or ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    #[default]
    Filtered,
    Passthrough,
}


//
// QUERY VALIDATION
//

fn positive<T: std::str::FromStr + PartialOrd + Default>(
    raw: Option<&String>,
    default: T,
    name: &str,
) -> Result<T, RelayError> {
    match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => match s.parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(RelayError::Validation(format!("Query parameter {} must be a positive integer", name))),
        },
    }
}

impl CandleQuery {
    pub fn from_params(params: &CandleParams, defaults: QueryDefaults, max_limit: u32) -> Result<Self, RelayError> {
        // #1. Mandatory fields
        let symbol = params.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let interval = params.interval.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (symbol, interval) = match (symbol, interval) {
            (Some(s), Some(i)) => (s.to_string(), i.to_string()),
            _ => {
                return Err(RelayError::Validation(
                    "Missing required query parameters: symbol, interval".to_string(),
                ))
            }
        };

        // #2. Numeric fields with defaults
        // An omitted limit falls back to the default, capped at the source maximum
        let limit: u32 = positive(params.limit.as_ref(), defaults.limit.min(max_limit), "limit")?;
        if limit > max_limit {
            return Err(RelayError::Validation(format!("Query parameter limit must not exceed {}", max_limit)));
        }
        let page: usize = positive(params.page.as_ref(), defaults.page.max(1), "page")?;
        let page_size: usize = positive(params.page_size.as_ref(), defaults.page_size.max(1), "pageSize")?;

        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        Ok(CandleQuery {
            symbol,
            interval,
            limit,
            page,
            page_size,
            from_date: non_empty(&params.from_date),
            to_date: non_empty(&params.to_date),
        })
    }
}


//
// EXCHANGE ADAPTER
//

pub struct ExchangeAdapter {
    source: Box<dyn KlineSource>,
    client: Arc<dyn UpstreamClient>,
    retry: RetryPolicy,
    range_mode: RangeMode,
    defaults: QueryDefaults,
}

impl ExchangeAdapter {
    pub fn new(source: Box<dyn KlineSource>, client: Arc<dyn UpstreamClient>) -> Self {
        Self {
            source,
            client,
            retry: RetryPolicy::default(),
            range_mode: RangeMode::default(),
            defaults: QueryDefaults::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_range_mode(mut self, mode: RangeMode) -> Self {
        self.range_mode = mode;
        self
    }

    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn exchange(&self) -> Exchange {
        self.source.exchange()
    }

    pub fn market(&self) -> MarketType {
        self.source.market()
    }

    pub async fn fetch_candles(&self, params: &CandleParams) -> Result<CandlePage, RelayError> {
        let result = self.run_pipeline(params).await;
        if let Err(e) = &result {
            error!("{} {} OHLCV Error: {}", self.exchange(), self.market(), e);
        }
        result
    }

    async fn run_pipeline(&self, params: &CandleParams) -> Result<CandlePage, RelayError> {
        // #1. Validate before anything touches the network
        let query: CandleQuery = CandleQuery::from_params(params, self.defaults, self.source.max_limit())?;
        let range: DateRange = match self.range_mode {
            RangeMode::Filtered => DateRange::parse(query.from_date.as_deref(), query.to_date.as_deref())?,
            RangeMode::Passthrough => DateRange::default(),
        };

        // #2. Build URL and call upstream under the retry policy
        let url: String = self.source.build_url(&query)?;
        info!("Fetching {} {} klines: {}", self.exchange(), self.market(), url);

        let target: &str = &url;
        let body: Value = self
            .retry
            .execute(move || async move {
                let body = self.client.get_json(target).await.map_err(|e| self.source.classify(e))?;
                self.source.inspect(&body)?;
                Ok::<Value, UpstreamError>(body)
            })
            .await?;

        // #3. Normalize, filter, page
        let candles: Vec<Candle> = self.source.parse_candles(body)?;
        let candles: Vec<Candle> = range.filter(candles);
        let page = paginate(candles, query.page, query.page_size);

        Ok(CandlePage {
            exchange: self.exchange(),
            market: self.market(),
            page,
            from_date: range.from,
            to_date: range.to,
        })
    }
}


//
// ROUTE LOOKUP
//

/// Every adapter the REST surface can reach, keyed by `/{exchange}/{endpoint}`.
pub struct AdapterSet {
    adapters: Vec<ExchangeAdapter>,
}

impl AdapterSet {
    pub fn new(adapters: Vec<ExchangeAdapter>) -> Self {
        Self { adapters }
    }

    pub fn get(&self, exchange: Exchange, market: MarketType) -> Option<&ExchangeAdapter> {
        self.adapters
            .iter()
            .find(|a| a.exchange() == exchange && a.market() == market)
    }

    /// Resolves a route pair such as ("binance", "spotOhLcv").
    pub fn lookup(&self, exchange: &str, endpoint: &str) -> Option<&ExchangeAdapter> {
        let market: MarketType = match endpoint {
            "spotOhLcv" => MarketType::Spot,
            "futuresOhLcv" => MarketType::Futures,
            _ => return None,
        };
        let exchange: Exchange = match (exchange, market) {
            ("binance", _) => Exchange::Binance,
            ("bybit", _) => Exchange::ByBit,
            ("mexc", _) => Exchange::Mexc,
            // legacy misspelt futures route
            ("mexe", MarketType::Futures) => Exchange::Mexc,
            _ => return None,
        };
        self.get(exchange, market)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
