use std::{collections::HashSet, sync::Arc};

use tiny_redis::{
    config::ServerConfig,
    key_value_store::{KeyValueStore, NopStore},
    resp::RespValue,
    server::{RedisServer, ServerError},
};

use crate::test_utils::{TestClient, TestEnv, TestUtils};

#[tokio::test]
async fn test_ping_set_get() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client.command("PING", &[], TestUtils::pong()).await;
    client.command("ping", &["hello"], TestUtils::pong()).await;
    client.command("GET", &["fruit"], RespValue::null()).await;
    client
        .command("SET", &["fruit", "strawberry"], RespValue::ok())
        .await;
    client
        .command("get", &["fruit"], TestUtils::bulk("strawberry"))
        .await;
    client.command("SET", &["fruit", ""], RespValue::ok()).await;
    client.command("GET", &["fruit"], TestUtils::bulk("")).await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_hash_commands() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client
        .command(
            "HSET",
            &["user", "name", "ada", "lang", "rust"],
            RespValue::Integer(2),
        )
        .await;
    client
        .command("HGET", &["user", "name"], TestUtils::bulk("ada"))
        .await;
    client
        .command("HGET", &["user", "missing"], RespValue::null())
        .await;
    client
        .command("HGETALL", &["nobody"], TestUtils::array(vec![]))
        .await;

    // A string key and a hash key with the same name do not collide
    client.command("SET", &["user", "plain"], RespValue::ok()).await;
    client.command("GET", &["user"], TestUtils::bulk("plain")).await;

    let fields: HashSet<_> = env.store.hgetall(b"user").into_iter().collect();
    assert_eq!(
        fields,
        HashSet::from([
            ("name".into(), "ada".into()),
            ("lang".into(), "rust".into()),
        ])
    );

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_hgetall_single_field() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client
        .command("HSET", &["h", "f", "v"], RespValue::Integer(1))
        .await;
    client
        .command(
            "HGETALL",
            &["h"],
            TestUtils::array(vec![TestUtils::bulk("f"), TestUtils::bulk("v")]),
        )
        .await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_errors_do_not_close_the_connection() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client
        .command(
            "FLUSHALL",
            &[],
            TestUtils::error("ERR unknown command 'FLUSHALL'"),
        )
        .await;
    client
        .command(
            "GET",
            &[],
            TestUtils::error("ERR wrong number of arguments for 'get' command"),
        )
        .await;
    client
        .command(
            "HSET",
            &["h", "f"],
            TestUtils::error("ERR wrong number of arguments for 'hset' command"),
        )
        .await;

    client.send_raw(b"*abc\r\n").await;
    client
        .expect_reply(TestUtils::error(
            "ERR Protocol error: invalid multibulk length 'abc'",
        ))
        .await;

    client.command("PING", &[], TestUtils::pong()).await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_clients_share_the_store() {
    let env = TestEnv::start().await;
    let mut writer = env.connect().await;
    let mut reader = env.connect().await;

    writer.command("SET", &["k", "v"], RespValue::ok()).await;
    reader.command("GET", &["k"], TestUtils::bulk("v")).await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_inline_and_fragmented_input() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client.send_raw(b"SET inline value\r\n").await;
    client.expect_reply(RespValue::ok()).await;

    for byte in b"*2\r\n$3\r\nGET\r\n$6\r\ninline\r\n" {
        client.send_raw(&[*byte]).await;
    }
    client.expect_reply(TestUtils::bulk("value")).await;

    // Pipelined requests are answered in order
    client
        .send_raw(b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n$6\r\ninline\r\nPING\r\n")
        .await;
    client.expect_reply(TestUtils::pong()).await;
    client.expect_reply(TestUtils::bulk("value")).await;
    client.expect_reply(TestUtils::pong()).await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client.command("PING", &[], TestUtils::pong()).await;

    env.cancel.cancel();
    client.expect_closed().await;
}

#[tokio::test]
async fn test_bind_fails_on_used_port() {
    let env = TestEnv::start().await;

    let config = ServerConfig {
        port: env.address.port(),
        ..ServerConfig::default()
    };

    let result = RedisServer::bind(config).await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_nop_store_accepts_writes_and_keeps_nothing() {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let server = RedisServer::bind_with_store(config, Arc::new(NopStore))
        .await
        .unwrap();
    let address = server.local_addr().unwrap();
    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(server.run(cancel.clone()));

    let mut client = TestClient::connect(address).await;
    client.command("SET", &["k", "v"], RespValue::ok()).await;
    client.command("GET", &["k"], RespValue::null()).await;
    client
        .command("HSET", &["h", "f", "v"], RespValue::Integer(1))
        .await;
    client
        .command("HGETALL", &["h"], TestUtils::array(vec![]))
        .await;

    cancel.cancel();
    assert!(handle.await.unwrap().is_ok());
}
