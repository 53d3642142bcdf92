use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_http_server::{Args, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_http_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from(Args::parse());
    let (mut server, cancel_ch) = HttpServer::serve(config.clone()).await?;
    tracing::info!(
        addr = %server.local_addr()?,
        directory = ?config.directory,
        "server started"
    );

    let mut handle = tokio::spawn(async move { server.listen().await });

    // the listener may also stop on its own after an accept error
    let finished = tokio::select! {
        outcome = &mut handle => Some(outcome),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            cancel_ch.send(()).ok();
            handle.await
        }
    };

    match outcome {
        Ok(Ok(())) => tracing::info!("Server shut down gracefully"),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "server error");
            return Err(e);
        }
        Err(e) => {
            tracing::error!(error = %e, "server task panicked");
            return Err(e.into());
        }
    }

    Ok(())
}
