use std::time::Duration;

use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("invalid --replicaof value '{0}', expected \"<host> <port>\" or \"<host>:<port>\"")]
    InvalidReplicaOf(String),
    #[error("--requirepass must not be empty")]
    EmptyPassword,
}

/// tiny-redis server
#[derive(Parser, Debug, Clone)]
#[command(name = "tiny-redis")]
#[command(about = "A small Redis compatible server that can replicate from a master")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 6379)]
    pub port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Require clients to AUTH with this password
    #[arg(long)]
    pub requirepass: Option<String>,

    /// Replicate from a master, given as "<host> <port>" or "<host>:<port>"
    #[arg(long)]
    pub replicaof: Option<String>,

    /// Delay between replication reconnect attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub replication_retry_ms: u64,

    /// Timeout for connecting to the master, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub replication_connect_timeout_ms: u64,
}

/// Where to replicate from and how patiently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    pub master_host: String,
    pub master_port: u16,
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
}

impl ReplicationConfig {
    pub fn new(master_host: impl Into<String>, master_port: u16) -> Self {
        Self {
            master_host: master_host.into(),
            master_port,
            retry_delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(3000),
        }
    }

    pub fn master_address(&self) -> String {
        format!("{}:{}", self.master_host, self.master_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub password: Option<String>,
    pub replication: Option<ReplicationConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            replication: None,
        }
    }
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.requirepass.as_deref() == Some("") {
            return Err(ConfigError::EmptyPassword);
        }

        let replication = cli
            .replicaof
            .as_deref()
            .map(parse_replica_of)
            .transpose()?
            .map(|(host, port)| ReplicationConfig {
                master_host: host,
                master_port: port,
                retry_delay: Duration::from_millis(cli.replication_retry_ms),
                connect_timeout: Duration::from_millis(cli.replication_connect_timeout_ms),
            });

        Ok(Self {
            bind: cli.bind,
            port: cli.port,
            password: cli.requirepass,
            replication,
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Accepts both `"host port"` (the redis.conf spelling) and `"host:port"`.
fn parse_replica_of(value: &str) -> Result<(String, u16), ConfigError> {
    let trimmed = value.trim();
    let (host, port) = trimmed
        .split_once(char::is_whitespace)
        .or_else(|| trimmed.rsplit_once(':'))
        .ok_or_else(|| ConfigError::InvalidReplicaOf(value.to_string()))?;

    let host = host.trim();
    let port = port.trim();

    if host.is_empty() {
        return Err(ConfigError::InvalidReplicaOf(value.to_string()));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::InvalidPort(port.to_string()))?;

    Ok((host.to_string(), port))
}
