use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use signal_hub::config::HubConfig;
use signal_hub::hub::Hub;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Spin up a real hub on an ephemeral port and return its base ws:// url
/// plus the `Hub` handle (for triggering shutdown from the test).
pub async fn spawn_hub() -> (String, Arc<Hub>) {
    let mut config = HubConfig::for_test();
    config.listen_addr = "127.0.0.1:0".to_string();
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let path = config.signaling_path.clone();

    let hub = Hub::new(config);
    let app = signal_hub::web::build_router(hub.clone());

    let shutdown_hub = hub.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_hub.subscribe_shutdown().recv().await;
            })
            .await
            .unwrap();
    });

    (format!("ws://{addr}{path}"), hub)
}

pub async fn connect(base_url: &str, name: Option<&str>) -> WsStream {
    let url = match name {
        Some(name) => format!("{base_url}?name={name}"),
        None => base_url.to_string(),
    };
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn send_json(ws: &mut WsStream, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

pub async fn recv_json(ws: &mut WsStream) -> serde_json::Value {
    match ws.next().await.unwrap().unwrap() {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}
