mod codec;
mod connection;
mod server;
mod test_utils;
mod transaction;
