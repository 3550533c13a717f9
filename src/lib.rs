//! A small Redis-compatible server in Rust.
//!
//! The server speaks RESP (both multibulk and inline requests) and supports:
//!
//! - String commands (GET, SET)
//! - Hash commands (HSET, HGET, HGETALL)
//! - Transactions (MULTI, EXEC)
//! - Password authentication (AUTH)
//! - Running as a replica of another server: PSYNC handshake, loading the
//!   master's RDB snapshot and applying its command stream
//!
//! Every client connection runs on its own Tokio task and shares a single
//! in-memory store with all the others.

pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
pub mod handshake;
pub mod input;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod snapshot;
