//! Translation between tungstenite messages and transport frames.

use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::trace;
use turborpc_transport_traits::{CloseReason, Frame, TransportError, TransportResult};

/// Convert an outbound frame into a tungstenite message.
pub(crate) fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Close(reason) => Message::Close(reason.map(|reason| CloseFrame {
            code: CloseCode::from(reason.code),
            reason: reason.reason.into(),
        })),
    }
}

/// Convert an inbound tungstenite item into a frame.
///
/// Control frames are swallowed (`None`); tungstenite has already answered pings.
pub(crate) fn from_message(item: Result<Message, WsError>) -> Option<TransportResult<Frame>> {
    match item {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(Ok(Frame::Binary(data))),
        Ok(Message::Close(frame)) => Some(Ok(Frame::Close(frame.map(|frame| {
            CloseReason::new(u16::from(frame.code), frame.reason.as_str())
        })))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
            trace!("Swallowed WebSocket control frame");
            None
        }
        Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => None,
        Err(e) => Some(Err(TransportError::ConnectionLost(e.to_string()))),
    }
}
