//! A tiny HTTP/1.1 server.
//!
//! Each connection carries exactly one request: the server reads it, picks
//! one of a handful of fixed routes, writes the response and closes.

pub mod compress;
pub mod config;
pub mod handlers;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use config::{Args, ServerConfig};
pub use server::HttpServer;
