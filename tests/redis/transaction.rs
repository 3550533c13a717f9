use tiny_redis::resp::RespValue;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_multi_exec_is_isolated_until_exec() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;
    let mut other = env.connect().await;

    client.command("MULTI", &[], RespValue::ok()).await;
    client
        .command("SET", &["fruit", "pear"], TestUtils::queued())
        .await;
    client
        .command("HSET", &["basket", "apples", "3"], TestUtils::queued())
        .await;
    client.command("GET", &["fruit"], TestUtils::queued()).await;

    // Nothing queued is visible to other clients before EXEC
    other.command("GET", &["fruit"], RespValue::null()).await;
    other
        .command("HGET", &["basket", "apples"], RespValue::null())
        .await;

    client
        .command(
            "EXEC",
            &[],
            TestUtils::array(vec![
                RespValue::ok(),
                RespValue::Integer(1),
                TestUtils::bulk("pear"),
            ]),
        )
        .await;

    other.command("GET", &["fruit"], TestUtils::bulk("pear")).await;
    other
        .command("HGET", &["basket", "apples"], TestUtils::bulk("3"))
        .await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_empty_transaction() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client.command("MULTI", &[], RespValue::ok()).await;
    client.command("EXEC", &[], TestUtils::array(vec![])).await;

    env.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_transaction_errors() {
    let env = TestEnv::start().await;
    let mut client = env.connect().await;

    client
        .command("EXEC", &[], TestUtils::error("ERR EXEC without MULTI"))
        .await;

    client.command("MULTI", &[], RespValue::ok()).await;
    client
        .command(
            "MULTI",
            &[],
            TestUtils::error("ERR MULTI calls can not be nested"),
        )
        .await;

    // Unknown commands are rejected right away and never queued
    client
        .command(
            "NOPE",
            &[],
            TestUtils::error("ERR unknown command 'NOPE'"),
        )
        .await;

    // Arity is checked when the queued command runs, not when it is queued
    client.command("GET", &[], TestUtils::queued()).await;
    client.command("SET", &["k", "v"], TestUtils::queued()).await;

    client
        .command(
            "EXEC",
            &[],
            TestUtils::array(vec![
                TestUtils::error("ERR wrong number of arguments for 'get' command"),
                RespValue::ok(),
            ]),
        )
        .await;

    // The transaction is over; the next EXEC has nothing to run
    client
        .command("EXEC", &[], TestUtils::error("ERR EXEC without MULTI"))
        .await;
    client.command("GET", &["k"], TestUtils::bulk("v")).await;

    env.shutdown().await.unwrap();
}
