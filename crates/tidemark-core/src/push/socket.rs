use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::push::manager::{PushInner, ScopeState};

/// Connection loop for one scope. Runs until the close signal fires, then
/// removes the scope's state entry.
///
/// Drops are not errors here: any disconnect parks the scope and retries
/// after the manager's fixed delay, as long as the scope stays subscribed.
pub(crate) async fn run_scope_socket(
    inner: Arc<PushInner>,
    scope_key: String,
    mut closed: watch::Receiver<bool>,
) {
    let url = format!("{}/_/websocket?key={}", inner.push_base, scope_key);
    loop {
        inner.set_state(&scope_key, ScopeState::Connecting);
        let connection = tokio::select! {
            connection = connect_async(url.as_str()) => connection,
            _ = wait_closed(&mut closed) => break,
        };
        match connection {
            Ok((socket, _)) => {
                inner.set_state(&scope_key, ScopeState::Open);
                if read_frames(&inner, socket, &mut closed).await {
                    break;
                }
            }
            Err(error) => {
                debug!(scope = %scope_key, error = %error, "push connect failed");
            }
        }
        inner.set_state(&scope_key, ScopeState::ClosedPendingReconnect);
        tokio::select! {
            _ = tokio::time::sleep(inner.reconnect_delay) => {}
            _ = wait_closed(&mut closed) => break,
        }
    }
    inner.clear_state(&scope_key);
}

/// Pump frames until the connection drops or the close signal fires.
/// Returns true when the close signal ended the session.
async fn read_frames(
    inner: &Arc<PushInner>,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: &mut watch::Receiver<bool>,
) -> bool {
    let (mut sink, mut source) = socket.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => inner.handle_frame(&text),
                Some(Ok(Message::Ping(payload))) => {
                    if sink.send(Message::Pong(payload)).await.is_err() {
                        return false;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return false,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(error = %error, "push socket read failed");
                    return false;
                }
            },
            _ = wait_closed(closed) => {
                let _ = sink.send(Message::Close(None)).await;
                return true;
            }
        }
    }
}

/// Resolves once the scope is unsubscribed. A dropped sender counts as a
/// close signal so the task can never outlive its manager.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    if *closed.borrow() {
        return;
    }
    while closed.changed().await.is_ok() {
        if *closed.borrow() {
            return;
        }
    }
}
