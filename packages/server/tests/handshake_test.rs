//! Integration tests: the server runs in-process on an ephemeral port and is
//! driven by real WebSocket clients.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use missionlink_server::{config::ServerConfig, ui::Server, wiring::build_app_state};
use missionlink_shared::{
    protocol::{ClientCommand, MissionSequence, RejectReason, ServerCommand},
    time::SystemClock,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(config: ServerConfig) -> Self {
        let state = build_app_state(&config, Arc::new(SystemClock)).unwrap();
        if let Some(mission) = &config.mission {
            state
                .mission_download_usecase
                .load_mission(mission)
                .await
                .unwrap();
        }
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(Server::new(state).serve(listener, std::future::pending()));
        TestServer { addr, handle }
    }

    fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/ws?{}", self.addr, query)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, query: &str) -> Socket {
        let (socket, _) = connect_async(self.ws_url(query)).await.unwrap();
        socket
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn send(socket: &mut Socket, command: ClientCommand) {
    socket
        .send(Message::Text(command.to_json().unwrap().into()))
        .await
        .unwrap();
}

/// Next server command, skipping control frames. `None` once the socket closes.
async fn next_command(socket: &mut Socket) -> Option<ServerCommand> {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, socket.next())
            .await
            .expect("timed out waiting for a frame")?;
        match msg {
            Ok(Message::Text(text)) => return Some(ServerCommand::from_json(&text).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Read until a command matches `pred` and return it.
async fn wait_for(
    socket: &mut Socket,
    pred: impl Fn(&ServerCommand) -> bool,
) -> ServerCommand {
    loop {
        let command = next_command(socket)
            .await
            .expect("socket closed before the expected command");
        if pred(&command) {
            return command;
        }
    }
}

async fn phase1_sequence(socket: &mut Socket) -> MissionSequence {
    match wait_for(socket, |c| matches!(c, ServerCommand::MissionStartPhase1 { .. })).await {
        ServerCommand::MissionStartPhase1 { sequence, .. } => sequence,
        _ => unreachable!(),
    }
}

async fn connection_phase(server: &TestServer, name: &str) -> String {
    let connections: Vec<serde_json::Value> = reqwest::get(server.http_url("/api/connections"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    connections
        .iter()
        .find(|c| c["name"] == name)
        .map(|c| c["phase"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start(ServerConfig::default()).await;

    // when (操作):
    let body: serde_json::Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_full_mission_download_handshake() {
    // テスト項目: 接続からスポーンまで、3 フェーズのハンドシェイクが完了する
    // given (前提条件):
    let server = TestServer::start(ServerConfig::default()).await;
    let mut socket = server.connect("name=Alice&identity=steam%3A1").await;

    // when (操作) / then (期待する結果):
    let accepted = next_command(&mut socket).await.unwrap();
    assert!(matches!(accepted, ServerCommand::ConnectAccepted { .. }));
    let me = wait_for(&mut socket, |c| {
        matches!(c, ServerCommand::ClientJoined { is_me: true, .. })
    })
    .await;
    assert!(matches!(me, ServerCommand::ClientJoined { client, .. } if client.name == "Alice"));

    let seq = phase1_sequence(&mut socket).await;
    send(&mut socket, ClientCommand::MissionStartPhase1Ack { sequence: seq }).await;

    wait_for(&mut socket, |c| matches!(c, ServerCommand::MissionStartPhase2 { .. })).await;
    send(&mut socket, ClientCommand::MissionStartPhase2Ack { sequence: seq }).await;

    let ghost_count = match wait_for(&mut socket, |c| {
        matches!(c, ServerCommand::GhostAlwaysStarted { .. })
    })
    .await
    {
        ServerCommand::GhostAlwaysStarted { ghost_count, .. } => ghost_count,
        _ => unreachable!(),
    };
    for expected in 0..ghost_count {
        let object = next_command(&mut socket).await.unwrap();
        assert!(matches!(object, ServerCommand::GhostAlwaysObject { index, .. } if index == expected));
    }
    send(&mut socket, ClientCommand::GhostAlwaysObjectsReceived { sequence: seq }).await;

    wait_for(&mut socket, |c| matches!(c, ServerCommand::MissionStartPhase3 { .. })).await;
    send(&mut socket, ClientCommand::MissionStartPhase3Ack { sequence: seq }).await;

    let start = wait_for(&mut socket, |c| matches!(c, ServerCommand::MissionStart { .. })).await;
    assert_eq!(start, ServerCommand::MissionStart { sequence: seq });
    let spawned = next_command(&mut socket).await.unwrap();
    assert!(matches!(spawned, ServerCommand::PlayerSpawned { .. }));

    assert_eq!(connection_phase(&server, "Alice").await, "Ready");
}

#[tokio::test]
async fn test_stale_ack_after_reload_is_ignored() {
    // テスト項目: ミッション再ロード後の古いシーケンスの ack は無視され、新しい ack で進む
    // given (前提条件):
    let server = TestServer::start(ServerConfig::default()).await;
    let mut socket = server.connect("name=Alice").await;
    let old = phase1_sequence(&mut socket).await;

    let response = reqwest::Client::new()
        .post(server.http_url("/api/mission"))
        .json(&serde_json::json!({ "name": "beginner/learn_the_roll" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let ended = wait_for(&mut socket, |c| matches!(c, ServerCommand::MissionEnd { .. })).await;
    assert_eq!(ended, ServerCommand::MissionEnd { sequence: old });
    let new = phase1_sequence(&mut socket).await;
    assert_eq!(new, old.next());

    // when (操作):
    send(&mut socket, ClientCommand::MissionStartPhase1Ack { sequence: old }).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // then (期待する結果):
    assert_eq!(connection_phase(&server, "Alice").await, "AwaitingPhase1Ack");

    send(&mut socket, ClientCommand::MissionStartPhase1Ack { sequence: new }).await;
    let phase2 = wait_for(&mut socket, |c| matches!(c, ServerCommand::MissionStartPhase2 { .. })).await;
    assert!(matches!(phase2, ServerCommand::MissionStartPhase2 { sequence, .. } if sequence == new));
}

#[tokio::test]
async fn test_full_server_rejects_with_reason() {
    // テスト項目: 満員のサーバーへの接続は CR_SERVERFULL を受け取って切断される
    // given (前提条件):
    let config = ServerConfig {
        max_players: 1,
        ..ServerConfig::default()
    };
    let server = TestServer::start(config).await;
    let mut alice = server.connect("name=Alice").await;
    next_command(&mut alice).await.unwrap();

    // when (操作):
    let mut bob = server.connect("name=Bob").await;

    // then (期待する結果):
    let rejected = next_command(&mut bob).await.unwrap();
    assert_eq!(
        rejected,
        ServerCommand::ConnectRejected {
            reason: RejectReason::ServerFull
        }
    );
    assert!(next_command(&mut bob).await.is_none());

    let info: serde_json::Value = reqwest::get(server.http_url("/api/server"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["public_slots"]["used"], 1);
    assert_eq!(info["public_slots"]["free"], 0);
}

#[tokio::test]
async fn test_bad_invite_is_rejected() {
    // テスト項目: 招待コードが一致しない接続は CHR_PASSWORD で拒否される
    // given (前提条件):
    let config = ServerConfig {
        private_slots: 2,
        invite_code: Some("marble".to_string()),
        ..ServerConfig::default()
    };
    let server = TestServer::start(config).await;

    // when (操作):
    let mut socket = server.connect("name=Eve&invite=wrong").await;

    // then (期待する結果):
    let rejected = next_command(&mut socket).await.unwrap();
    assert_eq!(
        rejected,
        ServerCommand::ConnectRejected {
            reason: RejectReason::BadInvite
        }
    );
}

#[tokio::test]
async fn test_drop_frees_slot_for_next_client() {
    // テスト項目: 切断でスロットが解放され、次のクライアントが参加できる
    // given (前提条件):
    let config = ServerConfig {
        max_players: 1,
        ..ServerConfig::default()
    };
    let server = TestServer::start(config).await;
    let mut alice = server.connect("name=Alice").await;
    next_command(&mut alice).await.unwrap();

    // when (操作):
    alice.close(None).await.unwrap();
    drop(alice);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let mut bob = server.connect("name=Bob").await;

    // then (期待する結果):
    let accepted = next_command(&mut bob).await.unwrap();
    assert!(matches!(accepted, ServerCommand::ConnectAccepted { .. }));
}
