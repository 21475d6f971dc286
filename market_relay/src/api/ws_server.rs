// @file: market_relay/src/api/ws_server.rs
// @description: Subscriber-facing WebSocket server. Every client receives broadcasts plus events for the groups it joined.
// @author: LAS.

use crate::core::broadcaster::{Broadcaster, OutboundEvent, Subscription};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;


//
// CLIENT COMMANDS
//

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Join,
    Leave,
}

#[derive(Debug, Deserialize)]
pub struct Command {
    pub action: CommandAction,
    pub group: String,
}


//
// SERVER ENTRY POINT
//

/// Pause after a failed accept (e.g. file descriptors exhausted) before trying again.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

pub async fn start_server(broadcaster: Broadcaster, bind_address: String) -> std::io::Result<()> {
    let listener: TcpListener = TcpListener::bind(&bind_address).await?;
    info!("WebSocket server listening on: {}", listener.local_addr()?);

    serve(listener, broadcaster).await;
    Ok(())
}

/// Accept loop over an already bound listener. Runs until the task is aborted.
pub async fn serve(listener: TcpListener, broadcaster: Broadcaster) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(handle_connection(stream, peer, broadcaster.clone()));
            }
            Err(e) => {
                warn!("Failed to accept subscriber: {}. Retrying in {}ms", e, ACCEPT_RETRY_DELAY.as_millis());
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}


//
// CONNECTION HANDLER
//

async fn handle_connection(stream: TcpStream, peer: SocketAddr, broadcaster: Broadcaster) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("Error during websocket handshake with {}: {}", peer, e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let mut subscription: Subscription = broadcaster.subscribe();

    info!("Client connected: {}", peer);

    loop {
        tokio::select! {
            client_msg = read.next() => {
                match client_msg {
                    Some(Ok(Message::Text(text))) => apply_command(&mut subscription, &text, peer),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("Read error from {}: {}", peer, e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            outbound = subscription.recv() => {
                let event: OutboundEvent = match outbound {
                    Some(event) => event,
                    None => break,
                };
                if write.send(Message::Text(event.frame.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Client disconnected: {}", peer);
}

fn apply_command(subscription: &mut Subscription, text: &str, peer: SocketAddr) {
    match serde_json::from_str::<Command>(text) {
        Ok(cmd) => match cmd.action {
            CommandAction::Join => {
                debug!("{} joined group {}", peer, cmd.group);
                subscription.join(cmd.group);
            }
            CommandAction::Leave => {
                debug!("{} left group {}", peer, cmd.group);
                subscription.leave(&cmd.group);
            }
        },
        Err(_) => debug!("Ignoring unknown command from {}", peer),
    }
}
