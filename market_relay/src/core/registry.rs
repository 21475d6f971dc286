// @file: market_relay/src/core/registry.rs
// @description: Tracks live feed handles so shutdown can close every one of them at once.
// @author: LAS.

use crate::core::ingestor::IngestorHandle;
use crate::core::models::{ConnectionState, StreamTarget};
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;


#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    handles: Arc<Mutex<Vec<IngestorHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handle: IngestorHandle) {
        let mut handles_guard = self.handles.lock().await;
        handles_guard.push(handle);
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }

    pub async fn states(&self) -> Vec<(StreamTarget, ConnectionState)> {
        let handles_guard = self.handles.lock().await;
        handles_guard
            .iter()
            .map(|h| (h.target().clone(), h.state()))
            .collect()
    }

    /// Moves every feed to Closing, waits for each to reach Closed, and empties the registry.
    pub async fn close_all(&self) {
        // #1. Drain under the lock, wait outside it
        let mut drained: Vec<IngestorHandle> = {
            let mut handles_guard = self.handles.lock().await;
            std::mem::take(&mut *handles_guard)
        };

        if drained.is_empty() {
            return;
        }
        info!("Closing {} upstream feeds...", drained.len());

        for handle in &drained {
            handle.close();
        }
        for handle in &mut drained {
            handle.join().await;
        }

        info!("All upstream feeds closed");
    }
}
