// @file: market_relay/src/core/broadcaster.rs
// @description: Process-wide fan-out of named events to every connected subscriber (or one group).
// @author: LAS.

use log::{debug, warn};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;


//
// TYPE DEFINITIONS
//

/// One serialized event. `frame` is the exact text pushed to subscribers.
#[derive(Debug, Clone)]
pub struct OutboundEvent {
    pub group: Option<String>,
    pub event: String,
    pub frame: Arc<str>,
}


//
// BROADCASTER
//

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<OutboundEvent>,
}

impl Broadcaster {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size.max(1));
        Broadcaster { tx }
    }

    /// Delivers to all subscribers. Dropped silently when nobody is listening.
    pub fn broadcast<P: Serialize>(&self, event: &str, payload: &P) {
        self.publish(None, event, payload);
    }

    /// Delivers only to subscribers that joined `group`.
    pub fn emit_to_group<P: Serialize>(&self, group: &str, event: &str, payload: &P) {
        self.publish(Some(group.to_string()), event, payload);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            groups: HashSet::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish<P: Serialize>(&self, group: Option<String>, event: &str, payload: &P) {
        // #1. Serialize once, every subscriber gets the same frame
        let frame: String = match serde_json::to_value(payload) {
            Ok(data) => json!({ "event": event, "data": data }).to_string(),
            Err(e) => {
                warn!("Dropping '{}' event, payload not serializable: {}", event, e);
                return;
            }
        };

        let outbound = OutboundEvent {
            group,
            event: event.to_string(),
            frame: Arc::from(frame),
        };

        // #2. Fire and forget. Err only means there are no receivers right now.
        if self.tx.send(outbound).is_err() {
            debug!("No subscribers for '{}', event dropped", event);
        }
    }
}


//
// SUBSCRIPTION
//

pub struct Subscription {
    rx: broadcast::Receiver<OutboundEvent>,
    groups: HashSet<String>,
}

impl Subscription {
    pub fn join(&mut self, group: impl Into<String>) {
        self.groups.insert(group.into());
    }

    pub fn leave(&mut self, group: &str) {
        self.groups.remove(group);
    }

    pub fn is_member(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Next event addressed to this subscriber. `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    let addressed = match &event.group {
                        None => true,
                        Some(group) => self.groups.contains(group),
                    };
                    if addressed {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagging, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
