use std::sync::Arc;

use tiny_redis::{
    commands::Session,
    connection::Connection,
    input::LineReader,
    key_value_store::{KeyValueStore, MemoryStore},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_read_only_connection_applies_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let store = Arc::new(MemoryStore::new());

    let handle = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            let (stream, peer) = listener.accept().await.unwrap();
            let (read_half, write_half) = stream.into_split();
            let mut reader = LineReader::new(BufReader::new(read_half));

            Connection::new(peer.to_string(), &mut reader, write_half, Session::trusted(store))
                .read_only()
                .run(&CancellationToken::new())
                .await
        }
    });

    let stream_bytes: &[u8] = b"*3\r\n$3\r\nSET\r\n$5\r\nfruit\r\n$4\r\npear\r\n\
        *4\r\n$4\r\nHSET\r\n$6\r\nbasket\r\n$6\r\napples\r\n$1\r\n3\r\n\
        *2\r\n$3\r\nGET\r\n$5\r\nfruit\r\n\
        *1\r\n$4\r\nPING\r\n";

    let mut master = TcpStream::connect(address).await.unwrap();
    master.write_all(stream_bytes).await.unwrap();
    master.shutdown().await.unwrap();

    let consumed = handle.await.unwrap();
    assert_eq!(consumed, stream_bytes.len() as u64);

    assert_eq!(store.get(b"fruit"), Some("pear".into()));
    assert_eq!(store.hget(b"basket", b"apples"), Some("3".into()));

    // Replies to GET and PING were never written back
    let mut written = Vec::new();
    master.read_to_end(&mut written).await.unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_read_only_connection_survives_bad_commands() {
    let store = Arc::new(MemoryStore::new());
    let input: &[u8] = b"*2\r\n$3\r\nGET\r\n*x\r\nBOGUS cmd\r\nSET after error\r\n";
    let mut reader = LineReader::new(BufReader::new(input));

    let consumed = Connection::new(
        "master",
        &mut reader,
        tokio::io::sink(),
        Session::trusted(Arc::clone(&store)),
    )
    .read_only()
    .run(&CancellationToken::new())
    .await;

    assert_eq!(consumed, input.len() as u64);
    assert_eq!(store.get(b"after"), Some("error".into()));
}
