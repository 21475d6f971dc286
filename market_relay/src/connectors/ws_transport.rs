// @file: market_relay/src/connectors/ws_transport.rs
// @description: tokio-tungstenite implementation of the feed socket used by every stream ingestor.
// @author: LAS.

use crate::core::error::FeedError;
use crate::core::interfaces::{FeedConnector, FeedSocket};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::debug;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;


pub struct TungsteniteConnector;

#[async_trait]
impl FeedConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedSocket>, FeedError> {
        let url: Url = Url::parse(url).map_err(|e| FeedError::Connect(format!("URL Parse Error: {}", e)))?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;
        Ok(Box::new(TungsteniteSocket { inner: ws_stream }))
    }
}


pub struct TungsteniteSocket {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedSocket for TungsteniteSocket {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.inner.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, FeedError>> {
        // Pings are answered by tungstenite itself; only text matters here
        while let Some(msg) = self.inner.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            debug!("Socket close returned: {}", e);
        }
    }
}
