use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::handlers::dispatch_handler;
use crate::request::{HttpRequest, RequestError};
use crate::response::ResponseWriter;

pub struct HttpServer {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    close_conn_rx: oneshot::Receiver<()>,
}

impl HttpServer {
    /// Binds the listener. The returned sender stops the accept loop.
    pub async fn serve(config: ServerConfig) -> Result<(Self, oneshot::Sender<()>)> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
        let (tx, rx) = oneshot::channel::<()>();
        Ok((
            Self {
                listener,
                config: Arc::new(config),
                close_conn_rx: rx,
            },
            tx,
        ))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts until shutdown is signalled. An accept error ends the loop
    /// with that error; connection tasks still running are left alone.
    pub async fn listen(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = &mut self.close_conn_rx => break,
                result = self.listener.accept() => {
                    let (conn, addr) = result.context("error accepting connection")?;
                    let config = Arc::clone(&self.config);
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(conn, addr, &config).await {
                            warn!(peer = %addr, error = %e, "connection error");
                        }
                    });
                }
            };
        }
        info!("Gracefully shutting down server...");
        Ok(())
    }

    /// One request, one response, then close.
    pub async fn handle_connection(
        conn: TcpStream,
        addr: SocketAddr,
        config: &ServerConfig,
    ) -> Result<()> {
        debug!(peer = %addr, "accepted connection");
        let (read_half, write_half) = conn.into_split();
        let mut reader = BufReader::new(read_half);

        let request = match HttpRequest::parse_from(&mut reader, &config.limits).await {
            Ok(request) => request,
            Err(RequestError::ConnectionClosed) => {
                debug!(peer = %addr, "peer closed without sending a request");
                return Ok(());
            }
            Err(e @ RequestError::MalformedRequestLine(_)) => {
                warn!(peer = %addr, error = %e, "invalid request, dropping connection");
                return Ok(());
            }
            Err(e) => return Err(e).context("reading request"),
        };

        let response = dispatch_handler(&request, config).await;
        info!(
            peer = %addr,
            request = %request.request_line,
            status = response.status.code(),
            "request served"
        );

        let mut writer = ResponseWriter::from(write_half);
        writer.write_all(&response).await.context("writing response")?;
        writer.shutdown().await.ok();

        debug!(peer = %addr, "closing connection");
        Ok(())
    }
}
