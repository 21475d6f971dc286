// @file: market_relay/src/tests/adapter_tests.rs
// @description: Exchange adapters over real HTTP (reqwest) against mockito upstreams.
// @author: LAS.

#[cfg(test)]
mod adapter_tests {
    use crate::connectors::binance::BinanceKlines;
    use crate::connectors::bybit::ByBitKlines;
    use crate::connectors::http_client::ReqwestClient;
    use crate::connectors::mexc::mexc_rest::SUPPORT_MESSAGE;
    use crate::connectors::mexc::{MexcFuturesKlines, MexcSpotKlines};
    use crate::connectors::rest_dispatch::ExchangeAdapter;
    use crate::core::error::RelayError;
    use crate::core::interfaces::{KlineSource, UpstreamClient};
    use crate::core::models::{CandlePage, MarketType};
    use crate::core::retry::RetryPolicy;
    use crate::tests::support::params;
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use std::time::Duration;

    fn adapter(source: Box<dyn KlineSource>) -> ExchangeAdapter {
        let client: Arc<dyn UpstreamClient> = Arc::new(ReqwestClient::new(Duration::from_secs(5)).unwrap());
        ExchangeAdapter::new(source, client).with_retry(RetryPolicy::new(3, Duration::from_millis(5)))
    }

    fn query_of(pairs: &[(&str, &str)]) -> Matcher {
        Matcher::AllOf(
            pairs
                .iter()
                .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
                .collect(),
        )
    }

    //
    // BINANCE
    //

    #[tokio::test]
    async fn binance_futures_positional_rows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/fapi/v1/klines")
            .match_query(query_of(&[("symbol", "BTCUSDT"), ("interval", "1m"), ("limit", "2")]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    [1704067200000,"42000.1","42100.0","41900.5","42050.0","12.5",1704067259999,"0",10,"0","0","0"],
                    [1704067260000,"42050.0","42060.0","42000.0","42010.2","3.1",1704067319999,"0",4,"0","0","0"]
                ]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let page: CandlePage = adapter(Box::new(BinanceKlines::new(MarketType::Futures, server.url())))
            .fetch_candles(&params(&[("symbol", "btcusdt"), ("interval", "1m"), ("limit", "2")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.page.total_items, 2);
        assert_eq!(page.page.data[0].open, "42000.1");
        assert_eq!(page.page.data[1].close, "42010.2");
        assert_eq!(page.page.data[1].open_time.timestamp_millis(), 1_704_067_260_000);
    }

    #[tokio::test]
    async fn http_429_is_retried_until_rate_limit_exceeded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"code":-1003,"msg":"Too many requests"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = adapter(Box::new(BinanceKlines::new(MarketType::Spot, server.url())))
            .fetch_candles(&params(&[("symbol", "BTCUSDT"), ("interval", "1m")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, RelayError::RateLimitExceeded);
        assert_eq!(err.to_string(), "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let err = adapter(Box::new(BinanceKlines::new(MarketType::Spot, server.url())))
            .fetch_candles(&params(&[("symbol", "BTCUSDT"), ("interval", "1m")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, RelayError::UpstreamException("Request failed with status code 500".to_string()));
    }

    //
    // BYBIT
    //

    #[tokio::test]
    async fn bybit_linear_category_and_result_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v5/market/kline")
            .match_query(query_of(&[("category", "linear"), ("symbol", "ETHUSDT"), ("interval", "60")]))
            .with_status(200)
            .with_body(
                r#"{"retCode":0,"retMsg":"OK","result":{"category":"linear","symbol":"ETHUSDT","list":[
                    ["1704070800000","2300.5","2310","2295","2305.25","1500.2","3456789.1"],
                    ["1704067200000","2290","2301","2288","2300.5","980","2250000"]
                ]}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let page: CandlePage = adapter(Box::new(ByBitKlines::new(MarketType::Futures, server.url())))
            .fetch_candles(&params(&[("symbol", "ETHUSDT"), ("interval", "60")]))
            .await
            .unwrap();

        mock.assert_async().await;
        // upstream order is kept (ByBit sends newest first)
        assert_eq!(page.page.data[0].open_time.timestamp_millis(), 1_704_070_800_000);
        assert_eq!(page.page.data[0].volume, "1500.2");
        assert_eq!(page.page.data[1].close, "2300.5");
    }

    #[tokio::test]
    async fn bybit_rate_limit_code_in_ok_envelope_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v5/market/kline")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"retCode":10006,"retMsg":"Too many visits!","result":{}}"#)
            .expect(3)
            .create_async()
            .await;

        let err = adapter(Box::new(ByBitKlines::new(MarketType::Spot, server.url())))
            .fetch_candles(&params(&[("symbol", "BTCUSDT"), ("interval", "1")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, RelayError::RateLimitExceeded);
    }

    #[tokio::test]
    async fn bybit_rate_limit_code_in_error_body_is_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v5/market/kline")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"retCode":10006,"retMsg":"Too many visits!"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = adapter(Box::new(ByBitKlines::new(MarketType::Spot, server.url())))
            .fetch_candles(&params(&[("symbol", "BTCUSDT"), ("interval", "1")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, RelayError::RateLimitExceeded);
    }

    #[tokio::test]
    async fn bybit_other_ret_codes_surface_ret_msg() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v5/market/kline")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"retCode":10001,"retMsg":"params error: symbol invalid","result":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = adapter(Box::new(ByBitKlines::new(MarketType::Spot, server.url())))
            .fetch_candles(&params(&[("symbol", "NOPE"), ("interval", "1")]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, RelayError::UpstreamException("params error: symbol invalid".to_string()));
    }

    //
    // MEXC
    //

    #[tokio::test]
    async fn mexc_spot_numeric_fields_become_strings() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(query_of(&[("symbol", "BTCUSDT"), ("interval", "1m"), ("limit", "100")]))
            .with_status(200)
            .with_body(r#"[[1704067200000,"42000.1","42100","41900","42050",12.5,1704067259999,"525000"]]"#)
            .create_async()
            .await;

        let page: CandlePage = adapter(Box::new(MexcSpotKlines::new(server.url())))
            .fetch_candles(&params(&[("symbol", "BTCUSDT"), ("interval", "1m")]))
            .await
            .unwrap();

        assert_eq!(page.page.data.len(), 1);
        assert_eq!(page.page.data[0].volume, "12.5");
    }

    #[tokio::test]
    async fn mexc_futures_columns_in_seconds() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/contract/kline/BTC_USDT")
            .match_query(query_of(&[("interval", "Min1"), ("limit", "100")]))
            .with_status(200)
            .with_body(
                r#"{"success":true,"code":0,"data":{
                    "time":[1704067200,1704067260],
                    "open":[42000.1,42050],
                    "close":[42050,42010.2],
                    "high":[42100,42060],
                    "low":[41900.5,42000],
                    "vol":[1250,310]
                }}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let page: CandlePage = adapter(Box::new(MexcFuturesKlines::new(server.url())))
            .fetch_candles(&params(&[("symbol", "BTC_USDT"), ("interval", "1m")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.page.total_items, 2);
        assert_eq!(page.page.data[0].open_time.timestamp_millis(), 1_704_067_200_000);
        assert_eq!(page.page.data[0].open, "42000.1");
        assert_eq!(page.page.data[1].close, "42010.2");
        assert_eq!(page.page.data[1].volume, "310");
    }

    #[tokio::test]
    async fn mexc_futures_failures_are_redacted() {
        let bodies = [
            r#"{"success":false,"code":1001,"message":"internal detail that must not leak"}"#,
            r#"{"success":true,"code":0,"data":{"time":[1704067200],"close":[1]}}"#,
        ];

        for body in bodies {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/api/v1/contract/kline/BTC_USDT")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let err = adapter(Box::new(MexcFuturesKlines::new(server.url())))
                .fetch_candles(&params(&[("symbol", "BTC_USDT"), ("interval", "1m")]))
                .await
                .unwrap_err();

            assert_eq!(err, RelayError::UpstreamException(SUPPORT_MESSAGE.to_string()));
        }
    }
}
