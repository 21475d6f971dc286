// @file: market_relay/src/tests/ws_server_tests.rs
// @description: Subscriber server over a real loopback socket: group commands and fan-out.
// @author: LAS.

#[cfg(test)]
mod ws_server_tests {
    use crate::api::ws_server::{serve, ACCEPT_RETRY_DELAY};
    use crate::core::broadcaster::Broadcaster;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout, Duration};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    async fn wait_for_subscribers(broadcaster: &Broadcaster, count: usize) {
        for _ in 0..200 {
            if broadcaster.subscriber_count() == count {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} subscribers, have {}", count, broadcaster.subscriber_count());
    }

    #[tokio::test]
    async fn joined_client_receives_group_events() {
        let broadcaster = Broadcaster::new(16);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, broadcaster.clone()));

        let (mut socket, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        wait_for_subscribers(&broadcaster, 1).await;

        socket
            .send(Message::Text(r#"{"action":"join","group":"desk-1"}"#.to_string()))
            .await
            .unwrap();

        // the join command is applied asynchronously, so keep emitting until it lands
        let mut received: Option<Value> = None;
        for _ in 0..50 {
            broadcaster.emit_to_group("desk-1", "alert", &json!({ "note": "rebalance" }));
            if let Ok(Some(Ok(Message::Text(text)))) = timeout(Duration::from_millis(50), socket.next()).await {
                received = Some(serde_json::from_str(&text).unwrap());
                break;
            }
        }
        assert_eq!(received, Some(json!({ "event": "alert", "data": { "note": "rebalance" } })));

        socket.close(None).await.unwrap();
        wait_for_subscribers(&broadcaster, 0).await;
        server.abort();
    }

    #[tokio::test]
    async fn server_keeps_accepting_after_a_client_leaves() {
        let broadcaster = Broadcaster::new(16);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, broadcaster.clone()));

        let (mut first, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        wait_for_subscribers(&broadcaster, 1).await;
        first.close(None).await.unwrap();
        wait_for_subscribers(&broadcaster, 0).await;

        let (mut second, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        wait_for_subscribers(&broadcaster, 1).await;

        broadcaster.broadcast("spot_trade_update", &json!({ "price": "1" }));
        let frame = timeout(Duration::from_secs(2), second.next()).await.unwrap().unwrap().unwrap();
        let frame: Value = serde_json::from_str(&frame.into_text().unwrap()).unwrap();
        assert_eq!(frame, json!({ "event": "spot_trade_update", "data": { "price": "1" } }));

        server.abort();
    }

    #[test]
    fn failed_accepts_pause_before_retrying() {
        assert!(ACCEPT_RETRY_DELAY >= Duration::from_millis(50));
        assert!(ACCEPT_RETRY_DELAY <= Duration::from_secs(1));
    }
}
