//! Round trips against a real tungstenite server on a loopback socket.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use turborpc_transport_traits::CloseReason;
use turborpc_websocket::{Connector, Frame, WebSocketConnector};

async fn spawn_server<F, Fut>(handler: F) -> String
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = accept_async(socket).await.unwrap();
        handler(ws).await;
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn test_echo_text_frames() {
    let url = spawn_server(|mut ws| async move {
        while let Some(Ok(message)) = ws.next().await {
            if message.is_text() {
                ws.send(message).await.unwrap();
            }
        }
    })
    .await;

    let mut connection = WebSocketConnector::new().connect(&url).await.unwrap();
    connection
        .sink
        .send(Frame::text(r#"{"uuid":"1","route":"PING"}"#))
        .await
        .unwrap();

    let echoed = connection.stream.next().await.unwrap().unwrap();
    assert_eq!(echoed, Frame::text(r#"{"uuid":"1","route":"PING"}"#));
}

#[tokio::test]
async fn test_server_close_code_is_reported() {
    let url = spawn_server(|mut ws| async move {
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "go away".into(),
        })))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    })
    .await;

    let mut connection = WebSocketConnector::new().connect(&url).await.unwrap();
    let frame = connection.stream.next().await.unwrap().unwrap();
    assert_eq!(frame, Frame::Close(Some(CloseReason::new(1008, "go away"))));
}
