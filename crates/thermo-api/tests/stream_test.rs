#![allow(clippy::unwrap_used)]
// Loopback tests for `StreamHandle` against a minimal Socket.IO server.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use thermo_api::{ReconnectConfig, StreamHandle, StreamProtocol};

async fn next_text<S>(ws: &mut S) -> String
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Close(_) => panic!("client closed early"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_socketio_handshake_heartbeat_and_event() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        ws.send(Message::text(r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#.to_owned()))
            .await
            .unwrap();
        assert_eq!(next_text(&mut ws).await, "40");

        ws.send(Message::text(r#"40{"sid":"n1"}"#.to_owned())).await.unwrap();
        ws.send(Message::text("2".to_owned())).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3");

        ws.send(Message::text(
            r#"42["message",{"device_id":"thermo-1","temperature":22.5}]"#.to_owned(),
        ))
        .await
        .unwrap();

        // Hold the socket until the client goes away.
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    let url = Url::parse(&format!("http://{addr}")).unwrap();
    let handle = StreamHandle::connect(
        url,
        StreamProtocol::SocketIo,
        ReconnectConfig::default(),
        cancel.clone(),
    )
    .unwrap();
    let mut rx = handle.subscribe();

    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no frame within 5s")
        .unwrap();
    assert_eq!(frame.event.as_deref(), Some("message"));
    let payload: serde_json::Value = serde_json::from_str(&frame.payload).unwrap();
    assert_eq!(payload["temperature"], 22.5);

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not finish")
        .unwrap();
}

#[tokio::test]
async fn test_json_protocol_passes_frames_through() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::text(r#"{"alarmDescription":"Door open"}"#.to_owned()))
            .await
            .unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    let url = Url::parse(&format!("ws://{addr}/")).unwrap();
    let handle =
        StreamHandle::connect(url, StreamProtocol::Json, ReconnectConfig::default(), cancel)
            .unwrap();
    let mut rx = handle.subscribe();

    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no frame within 5s")
        .unwrap();
    assert!(frame.event.is_none());
    assert_eq!(frame.payload, r#"{"alarmDescription":"Door open"}"#);
    handle.shutdown();
}
