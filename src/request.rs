use core::fmt;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::headers::Headers;

pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("connection closed before a request line was received")]
    ConnectionClosed,
    #[error("invalid http request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("header block exceeds {0} bytes")]
    HeadersTooLarge(usize),
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Size caps applied while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Request line plus every header line, terminators included.
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HTTPMethod {
    GET,
    POST,
    /// Any other token, kept verbatim. Routed like a GET.
    Other(String),
}

impl From<&str> for HTTPMethod {
    fn from(value: &str) -> Self {
        match value {
            "GET" => HTTPMethod::GET,
            "POST" => HTTPMethod::POST,
            other => HTTPMethod::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HTTPMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HTTPMethod::GET => write!(f, "GET"),
            HTTPMethod::POST => write!(f, "POST"),
            HTTPMethod::Other(token) => write!(f, "{}", token),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HTTPVersion {
    HTTP10,
    HTTP11,
}

impl HTTPVersion {
    pub fn from_token(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "HTTP/1.0" => Some(HTTPVersion::HTTP10),
            "HTTP/1.1" => Some(HTTPVersion::HTTP11),
            _ => None,
        }
    }
}

impl fmt::Display for HTTPVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HTTPVersion::HTTP10 => write!(f, "HTTP/1.0"),
            HTTPVersion::HTTP11 => write!(f, "HTTP/1.1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: HTTPMethod,
    pub target: String,
    /// `None` when the version token is missing or unrecognised.
    pub version: Option<HTTPVersion>,
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.version {
            Some(version) => write!(f, "{} {} {}", self.method, self.target, version),
            None => write!(f, "{} {}", self.method, self.target),
        }
    }
}

impl RequestLine {
    /// Needs at least a method and a target; extra tokens are ignored.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let mut parts = line.split_whitespace();
        let (Some(method_raw), Some(target_raw)) = (parts.next(), parts.next()) else {
            return Err(RequestError::MalformedRequestLine(line.to_string()));
        };

        Ok(Self {
            method: HTTPMethod::from(method_raw),
            target: target_raw.to_string(),
            version: parts.next().and_then(HTTPVersion::from_token),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn method(&self) -> &HTTPMethod {
        &self.request_line.method
    }

    pub fn path(&self) -> &str {
        &self.request_line.target
    }

    /// Reads one request: the request line, header lines up to the blank
    /// line, then exactly `Content-Length` body bytes.
    ///
    /// EOF inside the header block ends the headers. EOF inside the body is
    /// an error.
    pub async fn parse_from<R: AsyncBufRead + Unpin>(
        reader: &mut R,
        limits: &RequestLimits,
    ) -> Result<Self, RequestError> {
        let mut budget = limits.max_header_bytes;

        let line = read_line(reader, &mut budget, limits.max_header_bytes)
            .await?
            .ok_or(RequestError::ConnectionClosed)?;
        let request_line = RequestLine::parse(&line)?;

        let mut header_lines = Vec::new();
        while let Some(line) = read_line(reader, &mut budget, limits.max_header_bytes).await? {
            if line.is_empty() {
                break;
            }
            header_lines.push(line);
        }
        let headers = Headers::from_lines(header_lines.iter().map(String::as_str));

        let body = read_body(reader, &headers, limits.max_body_bytes).await?;

        Ok(Self {
            request_line,
            headers,
            body,
        })
    }
}

// Returns `None` at EOF. The line comes back without its terminator.
async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    budget: &mut usize,
    limit: usize,
) -> Result<Option<String>, RequestError> {
    if *budget == 0 {
        return Err(RequestError::HeadersTooLarge(limit));
    }

    let mut line_bytes = Vec::new();
    let n = (&mut *reader)
        .take(*budget as u64)
        .read_until(b'\n', &mut line_bytes)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if n == *budget && !line_bytes.ends_with(b"\n") {
        return Err(RequestError::HeadersTooLarge(limit));
    }
    *budget -= n;

    if line_bytes.ends_with(b"\n") {
        line_bytes.pop();
        if line_bytes.ends_with(b"\r") {
            line_bytes.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&line_bytes).into_owned()))
}

async fn read_body<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    headers: &Headers,
    limit: usize,
) -> Result<Vec<u8>, RequestError> {
    let Some(raw) = headers.get("Content-Length") else {
        return Ok(Vec::new());
    };
    let length: usize = raw
        .parse()
        .map_err(|_| RequestError::InvalidContentLength(raw.to_string()))?;
    if length > limit {
        return Err(RequestError::BodyTooLarge { length, limit });
    }

    // grows with what actually arrives, not with what was announced
    let mut body = Vec::new();
    (&mut *reader)
        .take(length as u64)
        .read_to_end(&mut body)
        .await?;
    if body.len() != length {
        return Err(RequestError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("body ended after {} of {} bytes", body.len(), length),
        )));
    }
    Ok(body)
}
