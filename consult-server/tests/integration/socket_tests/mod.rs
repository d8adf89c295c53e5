mod test_socket_close_leaves_room;
mod test_token_checked_before_upgrade;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use consult_core::ServerFrame;
use consult_server::{AppState, serve_on};
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves `state` on an ephemeral loopback port.
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, state));
    addr
}

pub fn presence_url(addr: SocketAddr, room: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => format!("ws://{addr}/ws/presence/{room}?token={token}"),
        None => format!("ws://{addr}/ws/presence/{room}"),
    }
}

pub async fn open(addr: SocketAddr, room: &str, token: Option<&str>) -> Socket {
    let (socket, _) = connect_async(presence_url(addr, room, token))
        .await
        .expect("websocket upgrade");
    socket
}

/// Next server frame, skipping pings and other non-text messages.
pub async fn next_frame(socket: &mut Socket) -> ServerFrame {
    let read = async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<ServerFrame>(text.as_str())
                        .expect("server sent an unreadable frame");
                }
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("no frame from server")
}
