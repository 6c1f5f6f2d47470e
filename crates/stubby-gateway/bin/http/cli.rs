use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "STUBBY_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "STUBBY_STORAGE_BACKEND";
pub const POSTGRES_DSN_ENV: &str = "STUBBY_POSTGRES_DSN";
pub const POSTGRES_MAX_CONNECTIONS_ENV: &str = "STUBBY_POSTGRES_MAX_CONNECTIONS";
pub const STORE_TIMEOUT_MS_ENV: &str = "STUBBY_STORE_TIMEOUT_MS";
pub const MAX_ALLOCATION_ATTEMPTS_ENV: &str = "STUBBY_MAX_ALLOCATION_ATTEMPTS";
pub const LOG_JSON_ENV: &str = "STUBBY_LOG_JSON";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_POSTGRES_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "stubby-gateway")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,

    #[arg(
        long,
        env = POSTGRES_MAX_CONNECTIONS_ENV,
        default_value_t = DEFAULT_POSTGRES_MAX_CONNECTIONS
    )]
    pub postgres_max_connections: u32,

    /// Deadline for every store operation, in milliseconds.
    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    pub store_timeout_ms: u64,

    /// Candidates tried per allocation before giving up.
    #[arg(
        long,
        env = MAX_ALLOCATION_ATTEMPTS_ENV,
        default_value_t = stubby_shortener::DEFAULT_MAX_ATTEMPTS
    )]
    pub max_allocation_attempts: u32,

    /// Emit logs as JSON lines.
    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,
}
