use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::compress::Encoding;
use crate::config::ServerConfig;
use crate::request::{HTTPMethod, HttpRequest};
use crate::response::{HttpResponse, HttpStatus};

const ECHO_PREFIX: &str = "/echo/";
const FILES_PREFIX: &str = "/files/";
const DEFAULT_CONTENT_TYPE: &str = "text/plain";
const FILE_CONTENT_TYPE: &str = "application/octet-stream";

// Handler error type
#[derive(Debug, Error)]
#[error("{status_code}: {message}")]
pub struct HandlerError {
    pub status_code: HttpStatus,
    pub message: String,
}

impl HandlerError {
    fn new(status_code: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Error responses carry no body; the message is only logged.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::new().with_status(self.status_code)
    }
}

// Request values reflected into the response head must be printable.
fn content_type(req: &HttpRequest) -> &str {
    req.headers
        .get_printable("Content-Type")
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Where a `/files/<name>` request points.
#[derive(Debug, PartialEq, Eq)]
enum FileTarget {
    /// No `--directory` was given.
    Unconfigured,
    /// The name has no path segments left (`""`, `"."`, `"/"`).
    Unnamed,
    Path(PathBuf),
}

/// Maps a `/files/<name>` name onto the served directory.
///
/// Only plain segments are kept, so leading slashes and `.` segments never
/// leave `dir`. Any `..` segment is refused outright.
fn resolve_file_path(dir: &Path, name: &str) -> Option<FileTarget> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(c) => relative.push(c),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return Some(FileTarget::Unnamed);
    }

    Some(FileTarget::Path(dir.join(relative)))
}

fn file_target(req: &HttpRequest, config: &ServerConfig) -> Result<FileTarget, HandlerError> {
    let name = req.path().strip_prefix(FILES_PREFIX).unwrap_or_default();
    let Some(dir) = &config.directory else {
        warn!(file = name, "file route requested but no --directory is configured");
        return Ok(FileTarget::Unconfigured);
    };
    resolve_file_path(dir, name).ok_or_else(|| {
        HandlerError::new(
            HttpStatus::BadRequest,
            format!("refusing file name {:?}", name),
        )
    })
}

pub async fn root_handler(_req: &HttpRequest) -> Result<HttpResponse, HandlerError> {
    Ok(HttpResponse::new())
}

pub async fn echo_handler(req: &HttpRequest) -> Result<HttpResponse, HandlerError> {
    let echo = req.path().strip_prefix(ECHO_PREFIX).unwrap_or_default();
    let accept_encoding = req.headers.get("Accept-Encoding").unwrap_or_default();

    let response = HttpResponse::new().with_header("Content-Type", content_type(req));
    match Encoding::from_accept_encoding(accept_encoding) {
        Encoding::Gzip => response
            .with_gzip_body(echo.as_bytes())
            .map_err(|e| HandlerError::new(HttpStatus::InternalServerError, e.to_string())),
        Encoding::Identity => Ok(response.with_body(echo)),
    }
}

pub async fn user_agent_handler(req: &HttpRequest) -> Result<HttpResponse, HandlerError> {
    let user_agent = req.headers.get("User-Agent").unwrap_or_default();
    Ok(HttpResponse::new()
        .with_header("Content-Type", content_type(req))
        .with_body(user_agent))
}

pub async fn read_file_handler(
    req: &HttpRequest,
    config: &ServerConfig,
) -> Result<HttpResponse, HandlerError> {
    let FileTarget::Path(path) = file_target(req, config)? else {
        return not_found_handler(req).await;
    };

    match tokio::fs::read(&path).await {
        Ok(data) => {
            debug!(path = %path.display(), bytes = data.len(), "serving file");
            Ok(HttpResponse::new()
                .with_header("Content-Type", FILE_CONTENT_TYPE)
                .with_body(data))
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "file not readable");
            not_found_handler(req).await
        }
    }
}

pub async fn write_file_handler(
    req: &HttpRequest,
    config: &ServerConfig,
) -> Result<HttpResponse, HandlerError> {
    let path = match file_target(req, config)? {
        FileTarget::Path(path) => path,
        FileTarget::Unconfigured => return not_found_handler(req).await,
        FileTarget::Unnamed => {
            return Err(HandlerError::new(HttpStatus::BadRequest, "no file name to write"));
        }
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);

    let write = async {
        let mut f = options.open(&path).await?;
        f.write_all(&req.body).await?;
        f.flush().await?;
        Ok::<_, std::io::Error>(())
    };
    write.await.map_err(|e| {
        HandlerError::new(
            HttpStatus::InternalServerError,
            format!("writing {}: {}", path.display(), e),
        )
    })?;

    debug!(path = %path.display(), bytes = req.body.len(), "stored file");
    Ok(HttpResponse::new().with_status(HttpStatus::Created))
}

pub async fn not_found_handler(_req: &HttpRequest) -> Result<HttpResponse, HandlerError> {
    Ok(HttpResponse::new().with_status(HttpStatus::NotFound))
}

/// Routes a request to exactly one handler, first match wins:
///
/// 1. `POST /files/<name>`
/// 2. `/`
/// 3. `/echo/<text>`
/// 4. `/user-agent`
/// 5. `/files/<name>` with any other method
/// 6. everything else is a 404
///
/// The `Status` request header override is applied to whatever comes back,
/// error responses included.
pub async fn dispatch_handler(req: &HttpRequest, config: &ServerConfig) -> HttpResponse {
    let path = req.path();
    let result = match path {
        p if *req.method() == HTTPMethod::POST && p.starts_with(FILES_PREFIX) => {
            write_file_handler(req, config).await
        }
        "/" => root_handler(req).await,
        p if p.starts_with(ECHO_PREFIX) => echo_handler(req).await,
        "/user-agent" => user_agent_handler(req).await,
        p if p.starts_with(FILES_PREFIX) => read_file_handler(req, config).await,
        _ => not_found_handler(req).await,
    };

    let response = result.unwrap_or_else(|e| {
        match e.status_code {
            HttpStatus::InternalServerError => error!(path, error = %e, "handler failed"),
            _ => warn!(path, error = %e, "request rejected"),
        }
        e.to_response()
    });

    response.with_status_override(&req.headers)
}
