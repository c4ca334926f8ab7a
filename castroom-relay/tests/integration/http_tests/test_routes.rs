use castroom_core::{BusEvent, Role, RoomCode};

use crate::integration::init_tracing;
use crate::utils::{TestRelay, WsPeer, http_request};

#[tokio::test]
async fn test_health() {
    init_tracing();
    let relay = TestRelay::start().await;

    let reply = http_request(relay.addr, "GET", "/health").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["ok"], true);
}

#[tokio::test]
async fn test_create_then_look_up_room() {
    init_tracing();
    let relay = TestRelay::start().await;

    let created = http_request(relay.addr, "POST", "/create-room").await;
    assert_eq!(created.status, 200);
    let code = created.body["room"].as_str().expect("room code missing").to_owned();
    assert_eq!(code.len(), 6);
    assert!(relay.service.room_info(&RoomCode::new(&code)).is_some());

    // Codes are case-insensitive.
    let path = format!("/room/{}", code.to_ascii_lowercase());
    let info = http_request(relay.addr, "GET", &path).await;
    assert_eq!(info.status, 200);
    assert_eq!(info.body["room"], code.as_str());
    assert_eq!(info.body["meta"]["participants"], serde_json::json!([]));
    assert_eq!(info.body["meta"]["hostOnline"], false);
}

#[tokio::test]
async fn test_room_lists_participants() {
    init_tracing();
    let relay = TestRelay::start().await;
    let room = relay.service.create_room().unwrap();
    let mut viewer = WsPeer::connect(&relay.ws_url()).await;

    viewer.join(&room, "Bob", Role::Viewer).await;
    viewer.recv_until(|e| matches!(e, BusEvent::Joined { .. })).await;

    let info = http_request(relay.addr, "GET", &format!("/room/{}", room)).await;
    assert_eq!(info.status, 200);
    let participants = info.body["meta"]["participants"]
        .as_array()
        .expect("participants should be a list");
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["id"], viewer.id.to_string());
    assert_eq!(participants[0]["name"], "Bob");
    assert_eq!(participants[0]["role"], "viewer");
}

#[tokio::test]
async fn test_unknown_room_is_404() {
    init_tracing();
    let relay = TestRelay::start().await;

    let reply = http_request(relay.addr, "GET", "/room/ZZZZZZ").await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body["error"], "room-not-found");
}
