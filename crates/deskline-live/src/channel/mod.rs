mod ws;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskline_domain::{ChatMessage, CoreError, CoreResult};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use ws::WsConnector;

pub const DEFAULT_PUSH_BUFFER_CAPACITY: usize = 64;
pub const DEFAULT_OUTBOUND_BUFFER_CAPACITY: usize = 16;

/// Lifecycle of the push connection. `Closed` is transient while a
/// reconnect is pending, and final after `shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "live",
            Self::Closed => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveChannelConfig {
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub push_buffer_capacity: usize,
    pub outbound_buffer_capacity: usize,
}

impl LiveChannelConfig {
    pub fn from_settings(
        ws_url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Result<Self, CoreError> {
        let ws_url = ws_url.into().trim().to_owned();
        if ws_url.is_empty() {
            return Err(CoreError::Configuration(
                "live.ws_url is empty. Provide a non-empty websocket url.".to_owned(),
            ));
        }
        if reconnect_delay.is_zero() {
            return Err(CoreError::Configuration(
                "live.reconnect_delay_secs must be greater than zero.".to_owned(),
            ));
        }

        Ok(Self {
            ws_url,
            reconnect_delay,
            push_buffer_capacity: DEFAULT_PUSH_BUFFER_CAPACITY,
            outbound_buffer_capacity: DEFAULT_OUTBOUND_BUFFER_CAPACITY,
        })
    }
}

/// One end of an established socket, write side.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: String) -> CoreResult<()>;
}

/// One end of an established socket, read side. `Ok(None)` is a clean
/// close; an error is a broken transport. Both end the session.
#[async_trait]
pub trait FrameStream: Send {
    async fn next_frame(&mut self) -> CoreResult<Option<String>>;
}

/// Seam between the channel loop and the network. The production
/// implementation dials a WebSocket; tests script connect outcomes
/// and frames.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self) -> CoreResult<(Box<dyn FrameSink>, Box<dyn FrameStream>)>;
}

/// Managed push connection. Owns the single background task that dials,
/// reads, writes, and reconnects; everything else goes through
/// `subscribe`/`send`/`state`/`shutdown`.
pub struct LiveChannel {
    push_tx: broadcast::Sender<ChatMessage>,
    outbound_tx: mpsc::Sender<ChatMessage>,
    state_rx: watch::Receiver<ChannelState>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl LiveChannel {
    /// Dials the configured WebSocket endpoint. Must run inside a tokio
    /// runtime.
    pub fn connect(config: LiveChannelConfig) -> Self {
        let connector = WsConnector::new(config.ws_url.clone());
        Self::spawn(config, Arc::new(connector))
    }

    pub fn spawn(config: LiveChannelConfig, connector: Arc<dyn SocketConnector>) -> Self {
        let (push_tx, _initial_receiver) = broadcast::channel(config.push_buffer_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer_capacity);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(run_channel_loop(
            connector,
            config.reconnect_delay,
            push_tx.clone(),
            outbound_rx,
            state_tx,
            stop_rx,
        ));

        Self {
            push_tx,
            outbound_tx,
            state_rx,
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Every subscriber sees every pushed message.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.push_tx.subscribe()
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Queues a message for delivery. Refused unless the channel is
    /// currently `Open`; nothing is queued on refusal.
    pub fn send(&self, message: ChatMessage) -> CoreResult<()> {
        self.sender().send(message)
    }

    /// Cheap cloneable sending handle, detached from the channel's
    /// lifetime so callers that only transmit need not own the channel.
    pub fn sender(&self) -> LiveSender {
        LiveSender {
            outbound_tx: self.outbound_tx.clone(),
            state_rx: self.state_rx.clone(),
        }
    }

    pub async fn shutdown(mut self) -> CoreResult<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.task.await.map_err(|error| {
            CoreError::Connectivity(format!("live channel task join failed: {error}"))
        })
    }
}

#[derive(Clone)]
pub struct LiveSender {
    outbound_tx: mpsc::Sender<ChatMessage>,
    state_rx: watch::Receiver<ChannelState>,
}

impl LiveSender {
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Same contract as [`LiveChannel::send`].
    pub fn send(&self, message: ChatMessage) -> CoreResult<()> {
        if self.state() != ChannelState::Open {
            return Err(CoreError::Connectivity(
                "live channel is not open; message was not sent".to_owned(),
            ));
        }
        self.outbound_tx
            .try_send(message)
            .map_err(|error| match error {
                mpsc::error::TrySendError::Full(_) => {
                    CoreError::Connectivity("live channel outbound queue is full".to_owned())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    CoreError::Connectivity("live channel task is no longer running".to_owned())
                }
            })
    }
}

enum SessionEnd {
    Stopped,
    Disconnected,
}

async fn run_channel_loop(
    connector: Arc<dyn SocketConnector>,
    reconnect_delay: Duration,
    push_tx: broadcast::Sender<ChatMessage>,
    mut outbound_rx: mpsc::Receiver<ChatMessage>,
    state_tx: watch::Sender<ChannelState>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let _ = state_tx.send(ChannelState::Connecting);
        let connected = tokio::select! {
            _ = &mut stop_rx => break,
            connected = connector.connect() => connected,
        };

        match connected {
            Ok((sink, stream)) => {
                let _ = state_tx.send(ChannelState::Open);
                debug!("live channel open");
                let session_end =
                    drive_session(sink, stream, &push_tx, &mut outbound_rx, &mut stop_rx).await;
                if matches!(session_end, SessionEnd::Stopped) {
                    break;
                }
            }
            Err(error) => {
                warn!(error = %error, "live channel connect failed");
            }
        }

        let _ = state_tx.send(ChannelState::Closed);
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    let _ = state_tx.send(ChannelState::Closed);
}

async fn drive_session(
    mut sink: Box<dyn FrameSink>,
    mut stream: Box<dyn FrameStream>,
    push_tx: &broadcast::Sender<ChatMessage>,
    outbound_rx: &mut mpsc::Receiver<ChatMessage>,
    stop_rx: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = &mut *stop_rx => return SessionEnd::Stopped,
            frame = stream.next_frame() => match frame {
                Ok(Some(text)) => match serde_json::from_str::<ChatMessage>(&text) {
                    Ok(message) => {
                        let _ = push_tx.send(message);
                    }
                    // A bad frame is the server's problem, not a reason
                    // to drop the connection.
                    Err(error) => warn!(error = %error, "skipping malformed push frame"),
                },
                Ok(None) => {
                    debug!("live channel closed by server");
                    return SessionEnd::Disconnected;
                }
                Err(error) => {
                    warn!(error = %error, "live channel read failed");
                    return SessionEnd::Disconnected;
                }
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(message) => {
                    let frame = match serde_json::to_string(&message) {
                        Ok(frame) => frame,
                        Err(error) => {
                            warn!(error = %error, "failed to encode outbound message");
                            continue;
                        }
                    };
                    if let Err(error) = sink.send_frame(frame).await {
                        warn!(error = %error, "live channel write failed");
                        return SessionEnd::Disconnected;
                    }
                }
                None => return SessionEnd::Stopped,
            },
        }
    }
}
