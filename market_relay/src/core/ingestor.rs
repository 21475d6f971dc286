// @file: market_relay/src/core/ingestor.rs
// @description: One persistent upstream trade socket per target: Connecting -> Open -> Closed, with flat-delay reconnects.
// @author: LAS.

use crate::core::broadcaster::Broadcaster;
use crate::core::interfaces::{FeedConnector, FeedSocket, TradeFeed};
use crate::core::models::{ConnectionState, StreamTarget, TradeEvent};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};


pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);


//
// HANDLE
//

/// Owner-side view of a running ingestor. Held by the ConnectionRegistry.
pub struct IngestorHandle {
    target: StreamTarget,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl IngestorHandle {
    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Requests shutdown. Idempotent: a handle already Closing or Closed is left alone.
    pub fn close(&self) {
        let requested: bool = self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = ConnectionState::Closing;
            true
        });

        if requested {
            info!("Closing feed {}", self.target);
            self.shutdown.send_replace(true);
        } else {
            debug!("Feed {} already closing or closed", self.target);
        }
    }

    /// Waits for the ingestor task to finish. The handle reads Closed afterwards,
    /// even when the task died without running its own teardown.
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Feed task for {} ended abnormally: {}", self.target, e);
            }
            self.state.send_replace(ConnectionState::Closed);
        }
    }
}


//
// INGESTOR
//

pub struct StreamIngestor {
    target: StreamTarget,
    feed: Arc<dyn TradeFeed>,
    connector: Arc<dyn FeedConnector>,
    broadcaster: Broadcaster,
    reconnect_delay: Duration,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl StreamIngestor {
    pub fn new(
        target: StreamTarget,
        feed: Arc<dyn TradeFeed>,
        connector: Arc<dyn FeedConnector>,
        broadcaster: Broadcaster,
    ) -> Self {
        let (state, _rx) = watch::channel(ConnectionState::Connecting);
        Self {
            target,
            feed,
            connector,
            broadcaster,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state: Arc::new(state),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn spawn(self) -> IngestorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let target: StreamTarget = self.target.clone();
        let state = self.state.clone();
        let task: JoinHandle<()> = tokio::spawn(self.run(shutdown_rx));

        IngestorHandle {
            target,
            state,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    //
    // STATE MACHINE
    //

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            // #1. Connecting: fresh socket every round
            self.transition(ConnectionState::Connecting);
            let url: String = self.feed.endpoint(&self.target);
            info!("Connecting to {} via {}", self.target, url);

            let connected = tokio::select! {
                result = self.connector.connect(&url) => result,
                _ = shutdown.changed() => break,
            };

            // #2. Open until the peer drops us or we are told to stop
            match connected {
                Ok(socket) => {
                    if self.session(socket, &mut shutdown).await {
                        break;
                    }
                }
                Err(e) => error!("Connection failed for {}: {}", self.target, e),
            }

            // #3. Flat reconnect delay, interruptible by shutdown
            self.transition(ConnectionState::Connecting);
            warn!("Feed {} down, reconnecting in {}s...", self.target, self.reconnect_delay.as_secs());
            tokio::select! {
                _ = sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.transition(ConnectionState::Closed);
        info!("Feed {} closed", self.target);
    }

    /// Returns true when the session ended because shutdown was requested.
    async fn session(&self, mut socket: Box<dyn FeedSocket>, shutdown: &mut watch::Receiver<bool>) -> bool {
        self.transition(ConnectionState::Open);
        info!("Connected to {}", self.target);

        if let Some(frame) = self.feed.subscribe_frame(&self.target) {
            if let Err(e) = socket.send_text(frame).await {
                warn!("Subscribe failed for {}: {}", self.target, e);
                return false;
            }
        }

        loop {
            tokio::select! {
                frame = socket.next_text() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        warn!("Error reading message for {}: {}", self.target, e);
                        return false;
                    }
                    None => {
                        info!("Connection closed by server for {}", self.target);
                        return false;
                    }
                },
                _ = shutdown.changed() => {
                    self.transition(ConnectionState::Closing);
                    socket.close().await;
                    return true;
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let trades: Vec<TradeEvent> = self.feed.parse_frame(&self.target, text);
        if trades.is_empty() {
            debug!("Ignoring non-trade frame from {}", self.target);
            return;
        }

        let event_name: &str = self.target.market.trade_event_name();
        for trade in &trades {
            self.broadcaster.broadcast(event_name, trade);
        }
    }

    fn transition(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            let allowed = match *current {
                ConnectionState::Closed => false,
                // once shutdown started only Closed may follow
                ConnectionState::Closing => next == ConnectionState::Closed,
                _ => *current != next,
            };
            if allowed {
                *current = next;
            }
            allowed
        });
    }
}
