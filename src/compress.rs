//! Response body compression.
//!
//! Only gzip is offered. Anything else is served as-is.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Identity,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Identity => "identity",
        }
    }

    /// Picks an encoding from an `Accept-Encoding` value.
    ///
    /// This is a plain substring test, not token-list parsing: both
    /// `gzip, deflate` and `notgzip` select gzip.
    pub fn from_accept_encoding(header: &str) -> Self {
        if header.contains("gzip") {
            Encoding::Gzip
        } else {
            Encoding::Identity
        }
    }
}

/// Gzip-frames `data` (RFC 1952) at the default compression level.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
