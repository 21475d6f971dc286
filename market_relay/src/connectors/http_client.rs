// @file: market_relay/src/connectors/http_client.rs
// @description: reqwest-backed upstream client shared by every kline source.
// @author: LAS.

use crate::core::error::UpstreamError;
use crate::core::interfaces::UpstreamClient;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;


pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client: Client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestClient {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        // #1. Execute Request
        let response = self.client.get(url).send().await?;
        let status = response.status();

        // #2. Error bodies are kept so exchange-specific codes can be inspected
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            return Err(UpstreamError::from_status(status.as_u16(), body));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::new(format!("JSON Parse Error: {}", e)))?;

        Ok(json)
    }
}
