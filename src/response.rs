use std::fmt;
use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::compress;
use crate::headers::Headers;

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum HttpStatus {
    Ok,
    Created,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl HttpStatus {
    pub fn code(&self) -> u16 {
        match self {
            HttpStatus::Ok => 200,
            HttpStatus::Created => 201,
            HttpStatus::BadRequest => 400,
            HttpStatus::NotFound => 404,
            HttpStatus::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::Created => "Created",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A response under construction.
///
/// Nothing is added implicitly: a bare `HttpResponse::new()` serializes to
/// `HTTP/1.1 200 OK\r\n\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: HttpStatus,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponse {
    pub fn new() -> Self {
        HttpResponse {
            status: HttpStatus::Ok,
            reason: HttpStatus::Ok.reason().to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Sets the status and resets the reason text to its standard phrase.
    pub fn with_status(mut self, status: HttpStatus) -> Self {
        self.status = status;
        self.reason = status.reason().to_string();
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body and its `Content-Length`.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.headers.insert("Content-Length", &self.body.len().to_string());
        self
    }

    /// Gzips `body`, then sets `Content-Encoding`, the body and the
    /// compressed `Content-Length`.
    pub fn with_gzip_body(self, body: &[u8]) -> io::Result<Self> {
        let compressed = compress::gzip(body)?;
        Ok(self
            .with_header("Content-Encoding", compress::Encoding::Gzip.as_str())
            .with_body(compressed))
    }

    /// Applies a `Status: <anything> <text>` request header.
    ///
    /// The value is split once on a space; only when that yields two parts
    /// is the reason replaced by the second. The code is never touched, and
    /// a value carrying control characters is ignored.
    pub fn with_status_override(self, request_headers: &Headers) -> Self {
        match request_headers
            .get_printable("Status")
            .and_then(|status| status.split_once(' '))
        {
            Some((_, text)) => self.with_reason(text),
            None => self,
        }
    }

    pub fn status_line(&self) -> String {
        format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.reason)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!("{}{}\r\n", self.status_line(), self.headers);
        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Write side of a connection.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn from(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_all(&mut self, response: &HttpResponse) -> Result<(), std::io::Error> {
        self.writer.write_all(&response.to_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), std::io::Error> {
        self.writer.shutdown().await
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
