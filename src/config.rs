//! Start-up configuration.
//!
//! Parsed once from the command line and shared read-only by every
//! connection task.

use std::path::PathBuf;

use clap::Parser;

use crate::request::{DEFAULT_MAX_BODY_BYTES, RequestLimits};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4221";

#[derive(Debug, Parser)]
#[command(name = "mini-http-server")]
#[command(
    about = "A tiny HTTP/1.1 server: echo, user-agent and a flat file store",
    long_about = None
)]
pub struct Args {
    /// Directory served and written by the /files/ routes
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Largest request body accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// `None` disables the file routes; they answer 404.
    pub directory: Option<PathBuf>,
    pub limits: RequestLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            directory: None,
            limits: RequestLimits::default(),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind,
            directory: args.directory,
            limits: RequestLimits {
                max_body_bytes: args.max_body_bytes,
                ..RequestLimits::default()
            },
        }
    }
}

impl ServerConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_the_documented_port() {
        let config = ServerConfig::from(Args::parse_from(["mini-http-server"]));
        assert_eq!(config.bind_addr, "0.0.0.0:4221");
        assert!(config.directory.is_none());
        assert_eq!(config.limits, RequestLimits::default());
    }

    #[test]
    fn directory_flag() {
        let config = ServerConfig::from(Args::parse_from([
            "mini-http-server",
            "--directory",
            "/tmp/data/",
            "--max-body-bytes",
            "1024",
        ]));
        assert_eq!(config.directory, Some(PathBuf::from("/tmp/data/")));
        assert_eq!(config.limits.max_body_bytes, 1024);
    }
}
