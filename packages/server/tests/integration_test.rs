//! Integration tests for the chanoma server using process-based testing.
//!
//! A real server process is spawned per test and exercised over real
//! WebSocket connections (tokio-tungstenite).

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper struct to manage server process lifecycle
struct TestServer {
    process: Child,
    port: u16,
}

impl TestServer {
    /// Start a test server on the specified port
    fn start(port: u16) -> Self {
        let process = Command::new("cargo")
            .args([
                "run",
                "--bin",
                "chanoma-server",
                "--",
                "--port",
                &port.to_string(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start server");

        TestServer { process, port }
    }

    /// Get the WebSocket URL for this server
    fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Connect a WebSocket client, retrying until the server is up
    async fn connect(&self) -> WsClient {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
        loop {
            match connect_async(self.url()).await {
                Ok((ws, _)) => return ws,
                Err(e) => {
                    if tokio::time::Instant::now() >= deadline {
                        panic!("Failed to connect to test server: {}", e);
                    }
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process when the test ends
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Send a JSON message over the WebSocket
async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send message");
}

/// Read messages until one matches the predicate (10 s timeout)
async fn read_until(
    ws: &mut WsClient,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = ws.next().await {
            let msg = msg.expect("WebSocket error while reading");
            if let Message::Text(text) = msg {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                    if predicate(&value) {
                        return value;
                    }
                }
            }
        }
        panic!("Connection closed while waiting for message");
    })
    .await
    .expect("Timed out waiting for message")
}

/// Create a room and join it, returning the room id
async fn create_and_join(ws: &mut WsClient, room_name: &str, mode: &str, username: &str) -> String {
    send_json(ws, serde_json::json!({
        "type": "create_room",
        "roomName": room_name,
        "mode": mode,
    }))
    .await;
    let reply = read_until(ws, |value| {
        value["type"] == "system" && value["text"].as_str().unwrap_or("").contains("Id: ")
    })
    .await;
    let text = reply["text"].as_str().unwrap().to_string();
    let room_id = text.split("Id: ").nth(1).unwrap().trim().to_string();

    send_json(ws, serde_json::json!({
        "type": "join_room",
        "roomId": room_id,
        "username": username,
    }))
    .await;
    read_until(ws, |value| {
        value["type"] == "system"
            && value["text"]
                .as_str()
                .unwrap_or("")
                .contains(&format!("{} joined", username))
    })
    .await;

    room_id
}

#[tokio::test]
async fn test_connect_replies_with_room_list() {
    // テスト項目: connect メッセージに room_list が返信される
    // given (前提条件):
    let server = TestServer::start(18090);
    let mut client = server.connect().await;

    // when (操作):
    send_json(&mut client, serde_json::json!({
        "type": "connect",
        "apiKey": "anything",
    }))
    .await;

    // then (期待する結果):
    let reply = read_until(&mut client, |value| value["type"] == "room_list").await;
    assert!(reply["rooms"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_room_broadcasts_room_list() {
    // テスト項目: ルーム作成で全接続に room_list が配信され、
    //             作成者にはルーム ID を含む system 返信が届く
    // given (前提条件):
    let server = TestServer::start(18091);
    let mut creator = server.connect().await;
    let mut observer = server.connect().await;

    // when (操作):
    send_json(&mut creator, serde_json::json!({
        "type": "create_room",
        "roomName": "Poker Night",
        "mode": "poker",
    }))
    .await;

    // then (期待する結果):
    let system = read_until(&mut creator, |value| {
        value["type"] == "system" && value["text"].as_str().unwrap_or("").contains("Id: ")
    })
    .await;
    assert!(system["text"].as_str().unwrap().contains("Poker Night"));

    let room_list = read_until(&mut observer, |value| {
        value["type"] == "room_list" && !value["rooms"].as_array().unwrap().is_empty()
    })
    .await;
    let rooms = room_list["rooms"].as_array().unwrap();
    assert_eq!(rooms[0]["roomName"], "Poker Night");
    assert_eq!(rooms[0]["mode"], "poker");
}

#[tokio::test]
async fn test_chat_roundtrip_between_two_clients() {
    // テスト項目: 同じルームの 2 クライアント間でチャットが往復する
    //             （送信者にもエコーされる）
    // given (前提条件):
    let server = TestServer::start(18092);
    let mut alice = server.connect().await;
    let room_id = create_and_join(&mut alice, "Casual", "casual", "Alice").await;

    let mut bob = server.connect().await;
    send_json(&mut bob, serde_json::json!({
        "type": "join_room",
        "roomId": room_id,
        "username": "Bob",
    }))
    .await;
    read_until(&mut bob, |value| {
        value["type"] == "system"
            && value["text"].as_str().unwrap_or("").contains("Bob joined")
    })
    .await;

    // when (操作): Alice がチャットを送信
    send_json(&mut alice, serde_json::json!({
        "type": "chat",
        "roomId": room_id,
        "text": "Hello from Alice!",
    }))
    .await;

    // then (期待する結果): Bob と Alice（エコー）の両方に届く
    let to_bob = read_until(&mut bob, |value| value["type"] == "chat").await;
    assert_eq!(to_bob["username"], "Alice");
    assert_eq!(to_bob["text"], "Hello from Alice!");

    let echo = read_until(&mut alice, |value| value["type"] == "chat").await;
    assert_eq!(echo["text"], "Hello from Alice!");
}

#[tokio::test]
async fn test_late_joiner_receives_replay_before_live_events() {
    // テスト項目: 後から参加したクライアントはライブ配信より先に
    //             リプレイログ全件を元の順序で受け取る
    // given (前提条件): Alice がルームでチャット済み
    let server = TestServer::start(18093);
    let mut alice = server.connect().await;
    let room_id = create_and_join(&mut alice, "Casual", "casual", "Alice").await;
    send_json(&mut alice, serde_json::json!({
        "type": "chat",
        "roomId": room_id,
        "text": "first message",
    }))
    .await;
    read_until(&mut alice, |value| value["type"] == "chat").await;

    // when (操作): Bob が後から参加する
    let mut bob = server.connect().await;
    send_json(&mut bob, serde_json::json!({
        "type": "join_room",
        "roomId": room_id,
        "username": "Bob",
    }))
    .await;

    // then (期待する結果): Bob の受信順は
    //   [Alice joined (リプレイ), first message (リプレイ), Bob joined (ライブ)]
    let mut order = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = bob.next().await {
            let msg = msg.expect("WebSocket error while reading");
            if let Message::Text(text) = msg {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                let label = format!(
                    "{}:{}",
                    value["type"].as_str().unwrap_or(""),
                    value["text"].as_str().unwrap_or("")
                );
                order.push(label.clone());
                if label.contains("Bob joined") {
                    break;
                }
            }
        }
    })
    .await
    .expect("Timed out waiting for replay");

    let alice_joined = order
        .iter()
        .position(|l| l.contains("Alice joined"))
        .expect("replayed join missing");
    let first_message = order
        .iter()
        .position(|l| l.contains("first message"))
        .expect("replayed chat missing");
    let bob_joined = order
        .iter()
        .position(|l| l.contains("Bob joined"))
        .expect("live join missing");
    assert!(alice_joined < first_message);
    assert!(first_message < bob_joined);
}

#[tokio::test]
async fn test_join_unknown_room_notifies_requester_only() {
    // テスト項目: 存在しないルームへの参加は要求した接続にだけ
    //             system メッセージで通知され、接続は維持される
    // given (前提条件):
    let server = TestServer::start(18094);
    let mut client = server.connect().await;

    // when (操作):
    send_json(&mut client, serde_json::json!({
        "type": "join_room",
        "roomId": "no-such-room",
        "username": "Alice",
    }))
    .await;

    // then (期待する結果):
    let reply = read_until(&mut client, |value| value["type"] == "system").await;
    assert!(reply["text"].as_str().unwrap().contains("not found"));

    // 接続は開いたまま: 続けて connect が処理される
    send_json(&mut client, serde_json::json!({
        "type": "connect",
        "apiKey": "anything",
    }))
    .await;
    read_until(&mut client, |value| value["type"] == "room_list").await;
}
