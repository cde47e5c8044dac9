use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpSocket, TcpStream};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use smallchat::client::Registry;
use smallchat::error::ChatServerError;
use smallchat::{Server, ServerConfig};

const WELCOME: &str = "Welcome Simple Chat! Use /nick to change nick name.\n";
const READ_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1".into(),
        port: 0,
        ..ServerConfig::default()
    }
}

// Start server on an ephemeral port in a background task
async fn start_test_server(config: ServerConfig) -> SocketAddr {
    start_test_server_with_registry(config).await.0
}

async fn start_test_server_with_registry(config: ServerConfig) -> (SocketAddr, Arc<Registry>) {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    tokio::spawn(async move { server.run().await });
    (addr, registry)
}

async fn registered_nicks(registry: &Registry) -> Vec<String> {
    registry
        .snapshot()
        .await
        .into_iter()
        .map(|(_, entry)| entry.nickname().to_string())
        .collect()
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    port: u16,
}

impl TestClient {
    // Connects without consuming anything from the stream
    async fn connect_raw(addr: SocketAddr) -> Self {
        Self::from_stream(TcpStream::connect(addr).await.unwrap())
    }

    fn from_stream(stream: TcpStream) -> Self {
        let port = stream.local_addr().unwrap().port();
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
            port,
        }
    }

    // Connects and waits for the welcome banner, which is sent after registration
    async fn connect(addr: SocketAddr) -> Self {
        Self::connect_raw(addr).await.expect_welcome().await
    }

    async fn expect_welcome(mut self) -> Self {
        assert_eq!(self.read_line().await, WELCOME);
        self
    }

    fn default_nick(&self) -> String {
        format!("user{}", self.port)
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        timeout(READ_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }
}

#[tokio::test]
async fn test_chat_reaches_others_but_not_sender() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;
    let mut carol = TestClient::connect(addr).await;

    alice.send("hello everyone\n").await;
    let expected = format!("{}: hello everyone\n", alice.default_nick());
    assert_eq!(bob.read_line().await, expected);
    assert_eq!(carol.read_line().await, expected);

    // Replies to alice are queued behind anything broadcast to her,
    // so an echo would show up before this line.
    alice.send("/foo bar\n").await;
    assert_eq!(alice.read_line().await, "Unknown command: /foo\n");
}

#[tokio::test]
async fn test_unknown_command_is_not_broadcast() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    alice.send("/foo bar\n").await;
    assert_eq!(alice.read_line().await, "Unknown command: /foo\n");

    alice.send("/nick\n").await;
    assert_eq!(alice.read_line().await, "Unknown command: /nick\n");

    alice.send("after\n").await;
    assert_eq!(
        bob.read_line().await,
        format!("{}: after\n", alice.default_nick())
    );
}

#[tokio::test]
async fn test_nick_change_is_acknowledged_and_announced() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    alice.send("/nick Bob\r\n").await;
    assert_eq!(
        alice.read_line().await,
        "Your nickname has been changed to: Bob\n"
    );
    assert_eq!(
        bob.read_line().await,
        format!("Server: {} changed nickname to Bob\n", alice.default_nick())
    );

    alice.send("hi\n").await;
    assert_eq!(bob.read_line().await, "Bob: hi\n");
}

#[tokio::test]
async fn test_nick_too_long_is_rejected() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    alice.send(&format!("/nick {}\n", "x".repeat(33))).await;
    assert_eq!(
        alice.read_line().await,
        "Nickname is too long. Maximum length is 32 characters.\n"
    );

    alice.send("still me\n").await;
    assert_eq!(
        bob.read_line().await,
        format!("{}: still me\n", alice.default_nick())
    );
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    alice.send("\n   \r\n  padded  \n").await;
    assert_eq!(
        bob.read_line().await,
        format!("{}: padded\n", alice.default_nick())
    );
}

#[tokio::test]
async fn test_departure_is_announced_once() {
    let addr = start_test_server(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    bob.send("/nick Alice\n").await;
    assert_eq!(
        bob.read_line().await,
        "Your nickname has been changed to: Alice\n"
    );
    assert_eq!(
        alice.read_line().await,
        format!("Server: {} changed nickname to Alice\n", bob.default_nick())
    );

    drop(bob);
    assert_eq!(alice.read_line().await, "Server: Alice left the chat\n");

    alice.send("/foo\n").await;
    assert_eq!(alice.read_line().await, "Unknown command: /foo\n");
}

#[tokio::test]
async fn test_full_server_rejects_connection() {
    let config = ServerConfig {
        max_clients: 1,
        ..test_config()
    };
    let addr = start_test_server(config).await;
    let _alice = TestClient::connect(addr).await;

    let mut bob = TestClient::connect_raw(addr).await;
    assert_eq!(bob.read_line().await, "Server is full. Try again later.\n");
    assert_eq!(bob.read_line().await, "");
}

#[tokio::test]
async fn test_registry_tracks_connections() {
    let (addr, registry) = start_test_server_with_registry(test_config()).await;

    let alice = TestClient::connect(addr).await;
    assert_eq!(registry.len().await, 1);
    assert_eq!(registered_nicks(&registry).await, vec![alice.default_nick()]);

    drop(alice);
    for _ in 0..50 {
        if registry.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = ServerConfig {
        port,
        ..test_config()
    };
    match Server::bind(config).await {
        Err(ChatServerError::Bind { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{}", port))
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("bind to an occupied port succeeded"),
    }
}

#[tokio::test]
async fn test_overlong_line_is_rejected() {
    let config = ServerConfig {
        max_line_length: 64,
        ..test_config()
    };
    let addr = start_test_server(config).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    alice.send(&format!("{}\n", "x".repeat(1 << 20))).await;
    assert_eq!(
        alice.read_line().await,
        "Line is too long. Maximum length is 64 bytes.\n"
    );

    // The rest of the rejected line is skipped; the next one goes through
    alice.send("short\n").await;
    assert_eq!(
        bob.read_line().await,
        format!("{}: short\n", alice.default_nick())
    );

    let at_limit = "y".repeat(64);
    alice.send(&format!("{}\n", at_limit)).await;
    assert_eq!(
        bob.read_line().await,
        format!("{}: {}\n", alice.default_nick(), at_limit)
    );
}

#[tokio::test]
async fn test_stalled_reader_is_disconnected() {
    let config = ServerConfig {
        max_line_length: 65536,
        outbound_queue_size: 4,
        ..test_config()
    };
    let (addr, registry) = start_test_server_with_registry(config).await;
    let mut alice = TestClient::connect(addr).await;

    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let stream = socket.connect(addr).await.unwrap();
    // Reads the welcome, then never reads again
    let sleepy = TestClient::from_stream(stream).expect_welcome().await;

    let payload = "z".repeat(60_000);
    for _ in 0..400 {
        alice.send(&format!("{}\n", payload)).await;
    }

    // Alice never gets her own lines back, so the next thing she sees is the departure
    assert_eq!(
        alice.read_line().await,
        format!("Server: {} left the chat\n", sleepy.default_nick())
    );
    assert_eq!(registered_nicks(&registry).await, vec![alice.default_nick()]);
}

#[tokio::test]
async fn test_reset_recipient_is_unregistered_once() {
    let (addr, registry) = start_test_server_with_registry(test_config()).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;

    let socket = TcpSocket::new_v4().unwrap();
    socket.set_linger(Some(Duration::ZERO)).unwrap();
    let stream = socket.connect(addr).await.unwrap();
    let carol = TestClient::from_stream(stream).expect_welcome().await;
    let carol_nick = carol.default_nick();

    // Zero linger turns the close into a reset
    drop(carol);
    for n in 0..20 {
        alice.send(&format!("tick {}\n", n)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for _ in 0..100 {
        if !registered_nicks(&registry).await.contains(&carol_nick) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!registered_nicks(&registry).await.contains(&carol_nick));

    tokio::time::sleep(Duration::from_millis(100)).await;
    alice.send("done\n").await;

    let departure = format!("Server: {} left the chat\n", carol_nick);
    let done = format!("{}: done\n", alice.default_nick());
    let mut departures = 0;
    loop {
        let line = bob.read_line().await;
        if line == departure {
            departures += 1;
        }
        if line == done {
            break;
        }
    }
    assert_eq!(departures, 1);
    assert_eq!(registry.len().await, 2);
}
