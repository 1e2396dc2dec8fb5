use async_trait::async_trait;
use deskline_domain::{CoreError, CoreResult};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{FrameSink, FrameStream, SocketConnector};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials the push endpoint over tokio-tungstenite and hands the split
/// halves to the channel loop.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SocketConnector for WsConnector {
    async fn connect(&self) -> CoreResult<(Box<dyn FrameSink>, Box<dyn FrameStream>)> {
        let (socket, _response) = connect_async(self.url.as_str()).await.map_err(|error| {
            CoreError::Connectivity(format!("websocket connect to {} failed: {error}", self.url))
        })?;
        let (sink, stream) = socket.split();
        Ok((
            Box::new(WsFrameSink { sink }),
            Box::new(WsFrameStream { stream }),
        ))
    }
}

struct WsFrameSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_frame(&mut self, frame: String) -> CoreResult<()> {
        self.sink
            .send(Message::text(frame))
            .await
            .map_err(|error| CoreError::Connectivity(format!("websocket write failed: {error}")))
    }
}

struct WsFrameStream {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> CoreResult<Option<String>> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Err(error)) => {
                    return Err(CoreError::Connectivity(format!(
                        "websocket read failed: {error}"
                    )))
                }
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Control frames and binary payloads are not chat traffic.
                Some(Ok(_)) => continue,
            }
        }
    }
}
