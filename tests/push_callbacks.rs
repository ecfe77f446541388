//! Push callback integration tests
//!
//! Drives the per-category callback servers over real HTTP: dispatch on
//! well-formed notifications, 400 on undecodable bodies, port lifecycle on
//! listener registration and removal.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use oneapi_sms::lifecycle::{PushCoordinator, WorkerState};
use oneapi_sms::listener::{
    DeliveryStatusPushListener, HlrPushListener, InboundMessagePushListener, ListenerError,
};
use oneapi_sms::model::{DeliveryInfoNotification, InboundSmsMessageList, RoamingNotification};
use oneapi_sms::push::{DeliveryStatusPush, HlrPush, InboundMessagePush, PushError};
use reqwest::StatusCode;
use serde_json::json;

/// Port allocator for tests that need a fixed, reusable port
static PORT: AtomicU16 = AtomicU16::new(18410);

fn next_port() -> u16 {
    PORT.fetch_add(1, Ordering::SeqCst)
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn post_json(addr: SocketAddr, body: &serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/notifications/sms"))
        .json(body)
        .send()
        .await
        .expect("request failed")
}

fn delivery_status_body(address: &str) -> serde_json::Value {
    json!({
        "deliveryInfoNotification": {
            "callbackData": "batch-7",
            "deliveryInfo": {
                "address": address,
                "deliveryStatus": "DeliveredToTerminal"
            }
        }
    })
}

struct StatusRecorder {
    seen: Mutex<Vec<DeliveryInfoNotification>>,
    fail: bool,
}

impl StatusRecorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl DeliveryStatusPushListener for StatusRecorder {
    fn on_delivery_status_notification(
        &self,
        notification: &DeliveryInfoNotification,
    ) -> Result<(), ListenerError> {
        self.seen.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err("listener rejected notification".into());
        }
        Ok(())
    }
}

#[derive(Default)]
struct InboundRecorder {
    seen: Mutex<Vec<InboundSmsMessageList>>,
}

impl InboundMessagePushListener for InboundRecorder {
    fn on_inbound_message_notification(
        &self,
        notification: &InboundSmsMessageList,
    ) -> Result<(), ListenerError> {
        self.seen.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RoamingRecorder {
    seen: Mutex<Vec<RoamingNotification>>,
}

impl HlrPushListener for RoamingRecorder {
    fn on_roaming_notification(
        &self,
        notification: &RoamingNotification,
    ) -> Result<(), ListenerError> {
        self.seen.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_well_formed_callback_dispatches_and_returns_ok() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
    let recorder = StatusRecorder::new();
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    let resp = post_json(addr, &delivery_status_body("tel:+15551240001")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Dispatch completes before the response is sent.
    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].delivery_info.address, "tel:+15551240001");
    assert_eq!(seen[0].callback_data.as_deref(), Some("batch-7"));
    drop(seen);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_undecodable_body_returns_bad_request_and_dispatches_nothing() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
    let recorder = StatusRecorder::new();
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    // Valid JSON, wrong root element.
    let resp = post_json(addr, &json!({"unexpectedRoot": {}})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Not JSON at all.
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/notifications/sms"))
        .body("definitely not json")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(recorder.count(), 0);

    // The server survives rejected bodies.
    let resp = post_json(addr, &delivery_status_body("tel:+15551240002")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(recorder.count(), 1);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_cross_category_payload_is_rejected() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
    let recorder = StatusRecorder::new();
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    // A roaming payload posted to the delivery status port decodes nothing.
    let roaming = json!({
        "terminalRoamingStatusList": {
            "roaming": { "address": "tel:+15551240003" }
        }
    });
    let resp = post_json(addr, &roaming).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(recorder.count(), 0);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_one_server_fans_out_to_all_listeners() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));

    let failing = StatusRecorder::failing();
    let second = StatusRecorder::new();
    let third = StatusRecorder::new();

    coordinator
        .add_listener(failing.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    coordinator
        .add_listener(second.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    coordinator
        .add_listener(third.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();

    // Later registrations reuse the bound server.
    assert_eq!(coordinator.local_addr().await, Some(addr));
    assert_eq!(coordinator.listeners().len(), 3);

    let resp = post_json(addr, &delivery_status_body("tel:+15551240004")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The failing listener does not stop its siblings.
    assert_eq!(failing.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(third.count(), 1);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_remove_releases_port_and_readd_rebinds() {
    init_tracing();
    let port = next_port();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(port));
    let recorder = StatusRecorder::new();

    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    assert_eq!(coordinator.local_addr().await, Some(loopback(port)));

    coordinator.remove_listeners().await;
    assert_eq!(coordinator.state(), WorkerState::Stopped);
    assert_eq!(coordinator.local_addr().await, None);

    // The configured port is bindable again.
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let resp = post_json(loopback(port), &delivery_status_body("tel:+15551240005")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(recorder.count(), 1);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_bind_conflict_surfaces_and_rolls_back() {
    init_tracing();
    let blocker = tokio::net::TcpListener::bind(loopback(0)).await.unwrap();
    let taken = blocker.local_addr().unwrap();

    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(taken);
    let recorder = StatusRecorder::new();

    let result = coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await;
    assert!(matches!(result, Err(PushError::Bind { addr, .. }) if addr == taken));
    assert!(coordinator.listeners().is_empty());
    assert_eq!(coordinator.state(), WorkerState::Stopped);

    // Registration works once the port frees up.
    drop(blocker);
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    assert_eq!(coordinator.listeners().len(), 1);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
    coordinator.remove_listeners().await;

    let recorder = StatusRecorder::new();
    coordinator
        .add_listener(recorder as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    coordinator.remove_listeners().await;
    coordinator.remove_listeners().await;
    assert_eq!(coordinator.state(), WorkerState::Stopped);
}

#[tokio::test]
async fn test_inbound_message_callback() {
    init_tracing();
    let coordinator: PushCoordinator<InboundMessagePush> = PushCoordinator::new(loopback(0));
    let recorder = Arc::new(InboundRecorder::default());
    coordinator
        .add_listener(recorder.clone() as Arc<dyn InboundMessagePushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    let body = json!({
        "inboundSMSMessageList": {
            "inboundSMSMessage": [
                {
                    "messageId": "in-200",
                    "senderAddress": "tel:+15551240006",
                    "destinationAddress": "3010",
                    "message": "BALANCE",
                    "dateTime": "2014-11-21T14:38:00Z"
                },
                {
                    "messageId": "in-201",
                    "senderAddress": "tel:+15551240007",
                    "destinationAddress": "3010",
                    "message": "HELP"
                }
            ],
            "numberOfMessagesInThisBatch": 2,
            "totalNumberOfPendingMessages": 0
        }
    });

    let resp = post_json(addr, &body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].inbound_sms_message.len(), 2);
    assert_eq!(seen[0].inbound_sms_message[1].message, "HELP");
    assert_eq!(seen[0].number_of_messages_in_this_batch, 2);
    drop(seen);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_roaming_callback() {
    init_tracing();
    let coordinator: PushCoordinator<HlrPush> = PushCoordinator::new(loopback(0));
    let recorder = Arc::new(RoamingRecorder::default());
    coordinator
        .add_listener(recorder.clone() as Arc<dyn HlrPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    let body = json!({
        "terminalRoamingStatusList": {
            "roaming": {
                "address": "tel:+15551240008",
                "currentRoaming": "Yes",
                "servingMccMnc": { "mcc": "648", "mnc": "03" },
                "retrievalStatus": "Retrieved"
            },
            "callbackData": "hlr-sub-3"
        }
    });

    let resp = post_json(addr, &body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].roaming.address, "tel:+15551240008");
    assert_eq!(seen[0].roaming.current_roaming.as_deref(), Some("Yes"));
    assert_eq!(seen[0].callback_data.as_deref(), Some("hlr-sub-3"));
    drop(seen);

    coordinator.remove_listeners().await;
}

#[tokio::test]
async fn test_root_path_also_accepts_callbacks() {
    init_tracing();
    let coordinator: PushCoordinator<DeliveryStatusPush> = PushCoordinator::new(loopback(0));
    let recorder = StatusRecorder::new();
    coordinator
        .add_listener(recorder.clone() as Arc<dyn DeliveryStatusPushListener>)
        .await
        .unwrap();
    let addr = coordinator.local_addr().await.unwrap();

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/"))
        .json(&delivery_status_body("tel:+15551240009"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(recorder.count(), 1);

    coordinator.remove_listeners().await;
}
