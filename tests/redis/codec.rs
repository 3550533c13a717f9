use bytes::Bytes;
use proptest::prelude::*;
use tiny_redis::{
    command::Command,
    input::{CommandParser, CommandReadError, LineReader},
};
use tokio::io::{AsyncWriteExt, BufReader};

fn argument() -> impl Strategy<Value = Vec<u8>> {
    let byte = any::<u8>().prop_filter("no line breaks", |b| *b != b'\r' && *b != b'\n');
    proptest::collection::vec(byte, 0..24)
}

fn command() -> impl Strategy<Value = Command> {
    ("[A-Z]{1,10}", proptest::collection::vec(argument(), 0..6)).prop_map(|(name, args)| {
        Command::new(&name, args.into_iter().map(Bytes::from).collect())
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Writes `input` in chunks of `chunk_size` bytes and decodes every command
/// until the stream ends.
async fn decode_chunked(input: Vec<u8>, chunk_size: usize) -> Vec<Command> {
    let (mut writer, reader) = tokio::io::duplex(64);

    tokio::spawn(async move {
        for chunk in input.chunks(chunk_size) {
            writer.write_all(chunk).await.unwrap();
        }
    });

    let mut reader = LineReader::new(BufReader::new(reader));
    let mut parser = CommandParser::new();
    let mut commands = Vec::new();

    loop {
        match parser.read_command(&mut reader).await {
            Ok(command) => commands.push(command),
            Err(CommandReadError::ConnectionClosed) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    commands
}

proptest! {
    #[test]
    fn test_encoded_commands_decode_unchanged(
        commands in proptest::collection::vec(command(), 1..8),
        chunk_size in 1usize..32,
    ) {
        let mut input = Vec::new();
        for command in &commands {
            input.extend_from_slice(&command.to_resp().encode());
        }

        let decoded = runtime().block_on(decode_chunked(input, chunk_size));
        prop_assert_eq!(decoded, commands);
    }

    #[test]
    fn test_garbage_never_panics(lines in proptest::collection::vec(argument(), 0..16)) {
        let mut parser = CommandParser::new();
        for line in lines {
            let _ = parser.feed(Bytes::from(line));
        }
    }
}
