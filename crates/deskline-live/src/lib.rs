pub mod channel;
pub mod feed;

pub use channel::{
    ChannelState, FrameSink, FrameStream, LiveChannel, LiveChannelConfig, LiveSender,
    SocketConnector, WsConnector,
};
pub use feed::{MessageFeed, MessageTransmitter, PushOutcome, FILE_MESSAGE_TEXT};
