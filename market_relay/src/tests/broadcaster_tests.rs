// @file: market_relay/src/tests/broadcaster_tests.rs
// @description: Fan-out, group addressing and lag handling of the Broadcaster, plus subscriber commands.
// @author: LAS.

#[cfg(test)]
mod broadcaster_tests {
    use crate::api::ws_server::{Command, CommandAction};
    use crate::core::broadcaster::Broadcaster;
    use serde_json::{json, Value};
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn broadcast_without_subscribers_is_a_noop() {
        let broadcaster = Broadcaster::new(8);
        assert_eq!(broadcaster.subscriber_count(), 0);

        broadcaster.broadcast("spot_trade_update", &json!({ "price": "1" }));
        broadcaster.emit_to_group("vip", "spot_trade_update", &json!({ "price": "1" }));

        // a subscriber arriving later sees nothing from before it joined
        let mut late = broadcaster.subscribe();
        assert!(timeout(Duration::from_millis(20), late.recv()).await.is_err());
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_frame() {
        let broadcaster = Broadcaster::new(8);
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.broadcast("spot_trade_update", &json!({ "symbol": "BTCUSDT" }));

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a.frame, b.frame);
        assert_eq!(a.group, None);

        let frame: Value = serde_json::from_str(&a.frame).unwrap();
        assert_eq!(frame, json!({ "event": "spot_trade_update", "data": { "symbol": "BTCUSDT" } }));
    }

    #[tokio::test]
    async fn group_events_reach_members_only() {
        let broadcaster = Broadcaster::new(8);
        let mut member = broadcaster.subscribe();
        let mut outsider = broadcaster.subscribe();
        member.join("desk-1");
        assert!(member.is_member("desk-1"));

        broadcaster.emit_to_group("desk-1", "alert", &"rebalance");
        broadcaster.broadcast("futures_trade_update", &json!({ "price": "2" }));

        assert_eq!(member.recv().await.unwrap().event, "alert");
        assert_eq!(member.recv().await.unwrap().event, "futures_trade_update");
        assert_eq!(outsider.recv().await.unwrap().event, "futures_trade_update");

        member.leave("desk-1");
        broadcaster.emit_to_group("desk-1", "alert", &"again");
        assert!(timeout(Duration::from_millis(20), member.recv()).await.is_err());
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_missed_events() {
        let broadcaster = Broadcaster::new(2);
        let mut slow = broadcaster.subscribe();

        for i in 0..5 {
            broadcaster.broadcast(&format!("e{}", i), &i);
        }

        // only the newest events fit in the buffer
        assert_eq!(slow.recv().await.unwrap().event, "e3");
        assert_eq!(slow.recv().await.unwrap().event, "e4");
    }

    #[tokio::test]
    async fn recv_ends_when_broadcaster_is_gone() {
        let broadcaster = Broadcaster::new(2);
        let mut sub = broadcaster.subscribe();
        drop(broadcaster);

        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn subscriber_commands() {
        let join: Command = serde_json::from_str(r#"{"action":"join","group":"desk-1"}"#).unwrap();
        assert_eq!(join.action, CommandAction::Join);
        assert_eq!(join.group, "desk-1");

        let leave: Command = serde_json::from_str(r#"{"action":"leave","group":"desk-1"}"#).unwrap();
        assert_eq!(leave.action, CommandAction::Leave);

        assert!(serde_json::from_str::<Command>(r#"{"action":"shout","group":"x"}"#).is_err());
    }
}
