//! Server network layer: accepts WebSocket connections and bridges them to the
//! session coordinator.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::registry::{Channel, ChannelId};
use crate::session::Coordinator;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use pong_shared::{ClientMessage, ServerMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Listens for clients and spawns one task per connection
pub struct Server {
    listener: TcpListener,
    coordinator: Coordinator,
    next_channel_id: Arc<AtomicU64>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::bind_with(config, Coordinator::new(config)).await
    }

    /// Binds with a caller-supplied coordinator, so tests can inspect its state.
    pub async fn bind_with(
        config: &ServerConfig,
        coordinator: Coordinator,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        info!("Server listening on {}", config.bind_addr);

        Ok(Server {
            listener,
            coordinator,
            next_channel_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Accept)
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Accept loop. Only returns if the listener itself fails.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    continue;
                }
            };

            let channel_id = self.next_channel_id.fetch_add(1, Ordering::Relaxed);
            let coordinator = self.coordinator.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, channel_id, coordinator).await {
                    warn!("Connection {} from {} failed: {}", channel_id, addr, e);
                }
            });
        }
    }
}

/// Drives one client from handshake to disconnect.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    channel_id: ChannelId,
    coordinator: Coordinator,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream).await?;
    info!("Client connected from {} on channel {}", addr, channel_id);

    let (sink, mut frames) = ws_stream.split();
    let (sender, receiver) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, receiver, channel_id));

    coordinator.connect(Channel::new(channel_id, sender)).await;

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => coordinator.handle_frame(channel_id, &text).await,
            Ok(Message::Binary(bytes)) => match ClientMessage::decode_bytes(&bytes) {
                Ok(message) => coordinator.dispatch(channel_id, message).await,
                Err(e) => warn!("Ignoring binary frame from channel {}: {}", channel_id, e),
            },
            Ok(Message::Close(_)) => {
                debug!("Channel {} sent close", channel_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Read error on channel {}: {}", channel_id, e);
                break;
            }
        }
    }

    // Dropping the registry's sender ends the writer task
    coordinator.disconnect(channel_id).await;
    if let Err(e) = writer.await {
        error!("Writer task for channel {} panicked: {}", channel_id, e);
    }
    info!("Client {} on channel {} disconnected", addr, channel_id);

    Ok(())
}

/// Serialises queued messages onto the socket until the queue closes or the
/// socket fails.
async fn write_frames(
    mut sink: WsSink,
    mut receiver: mpsc::UnboundedReceiver<ServerMessage>,
    channel_id: ChannelId,
) {
    while let Some(message) = receiver.recv().await {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {} for channel {}: {}", message.kind(), channel_id, e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            warn!("Write to channel {} failed: {}", channel_id, e);
            break;
        }
    }

    let _ = sink.close().await;
}
