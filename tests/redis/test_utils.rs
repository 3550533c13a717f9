use std::{net::SocketAddr, sync::Arc, time::Duration};

use tiny_redis::{
    command::Command,
    config::ServerConfig,
    key_value_store::MemoryStore,
    resp::RespValue,
    server::{RedisServer, ServerError},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// A server running on an ephemeral port for the duration of a test
pub struct TestEnv {
    pub address: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub cancel: CancellationToken,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestEnv {
    /// Start a server without a password
    pub async fn start() -> Self {
        Self::start_with(ServerConfig {
            port: 0,
            ..ServerConfig::default()
        })
        .await
    }

    /// Start a server that requires `password`
    pub async fn start_with_password(password: &str) -> Self {
        Self::start_with(ServerConfig {
            port: 0,
            password: Some(password.to_string()),
            ..ServerConfig::default()
        })
        .await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let server = RedisServer::bind_with_store(config, Arc::clone(&store))
            .await
            .unwrap();
        let address = server.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(server.run(cancel.clone()));

        Self {
            address,
            store,
            cancel,
            handle,
        }
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(self.address).await
    }

    /// Cancel the server and wait for the accept loop to finish
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.cancel.cancel();
        timeout(REPLY_TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

/// A raw TCP client that checks replies byte for byte
pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    pub async fn connect(address: SocketAddr) -> Self {
        Self {
            stream: TcpStream::connect(address).await.unwrap(),
        }
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
        self.stream.flush().await.unwrap();
    }

    pub async fn send(&mut self, name: &str, args: &[&str]) {
        let encoded = Command::from_parts(name, args).to_resp().encode();
        self.send_raw(&encoded).await;
    }

    /// Read exactly as many bytes as `expected` encodes to and compare
    pub async fn expect_reply(&mut self, expected: RespValue) {
        let expected = expected.encode();
        let mut buffer = vec![0; expected.len()];

        timeout(REPLY_TIMEOUT, self.stream.read_exact(&mut buffer))
            .await
            .expect("timed out waiting for reply")
            .unwrap();

        assert_eq!(
            String::from_utf8_lossy(&buffer),
            String::from_utf8_lossy(&expected)
        );
    }

    /// Send a command and assert on its reply
    pub async fn command(&mut self, name: &str, args: &[&str], expected: RespValue) {
        self.send(name, args).await;
        self.expect_reply(expected).await;
    }

    /// Succeeds once the server has closed the connection
    pub async fn expect_closed(&mut self) {
        let mut buffer = [0; 16];
        let read = timeout(REPLY_TIMEOUT, self.stream.read(&mut buffer))
            .await
            .expect("connection was not closed");

        assert!(matches!(read, Ok(0) | Err(_)));
    }
}

pub struct TestUtils;

impl TestUtils {
    pub fn pong() -> RespValue {
        RespValue::SimpleString("PONG".to_string())
    }

    pub fn queued() -> RespValue {
        RespValue::SimpleString("QUEUED".to_string())
    }

    pub fn error(message: &str) -> RespValue {
        RespValue::Error(message.to_string())
    }

    pub fn bulk(value: &str) -> RespValue {
        RespValue::bulk(value.to_string())
    }

    pub fn array(values: Vec<RespValue>) -> RespValue {
        RespValue::Array(values)
    }
}
