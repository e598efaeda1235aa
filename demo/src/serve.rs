//! Echo server

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::{debug, info, warn};
use turborpc::Envelope;

use crate::cli::ServeArgs;

pub(crate) async fn run(args: ServeArgs) -> Result<()> {
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!("Echo server listening on ws://{}", listener.local_addr()?);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted.context("accept failed")?;
                let reject_with = args.reject_with;
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(socket, reject_with).await {
                        warn!("Connection from {} ended with error: {:#}", peer, e);
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

async fn serve_connection(socket: TcpStream, reject_with: Option<u16>) -> Result<()> {
    let peer = socket.peer_addr()?;
    let mut ws = accept_async(socket).await.context("handshake failed")?;
    info!("Client connected from {}", peer);

    if let Some(code) = reject_with {
        ws.send(Message::Close(Some(CloseFrame {
            code: code.into(),
            reason: "rejected".into(),
        })))
        .await?;
        info!("Rejected {} with close code {}", peer, code);
        return Ok(());
    }

    while let Some(message) = ws.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let Some(response) = respond(text.as_str()) else {
            continue;
        };
        ws.send(Message::text(response.to_json()?)).await?;
    }

    info!("Client {} disconnected", peer);
    Ok(())
}

/// Answer `PING` with `PONG` and echo everything else back as a reply.
fn respond(text: &str) -> Option<Envelope> {
    let request = match Envelope::from_json(text) {
        Ok(request) => request,
        Err(e) => {
            warn!("Ignoring malformed message: {}", e);
            return None;
        }
    };

    if request.is_ping() {
        debug!("PING {}", request.uuid);
        return Some(Envelope::pong().with_correlation_id(request.uuid));
    }

    debug!("{} {}", request.route, request.uuid);
    Some(Envelope::reply_to(&request, request.payload.clone()))
}
