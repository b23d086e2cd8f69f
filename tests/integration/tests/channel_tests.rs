//! Realtime session channel integration tests
//!
//! Drives the channel client against an in-process websocket server that
//! can push session signals.
//!
//! Run with: cargo test -p integration-tests --test channel_tests

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use dine_channel::{ChannelEvent, SessionChannel};
use dine_common::ChannelConfig;
use dine_core::{Role, TokenKind};
use futures_util::{SinkExt, StreamExt};
use integration_tests::{client_session, fresh_pair, wait_until, MockBackend, RecordingNavigator};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::Message;

/// Outbound handles to every client the mock server accepted
type Senders = Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>;

/// Authorization header of every accepted handshake, in order
type AuthHeaders = Arc<Mutex<Vec<String>>>;

/// Spawn a websocket server that records handshakes and lets the test push
/// messages to connected clients
async fn spawn_ws_server() -> (String, AuthHeaders, Senders) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let auth_headers: AuthHeaders = Arc::new(Mutex::new(Vec::new()));
    let senders: Senders = Arc::new(Mutex::new(Vec::new()));

    let task_headers = Arc::clone(&auth_headers);
    let task_senders = Arc::clone(&senders);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let headers = Arc::clone(&task_headers);
            let senders = Arc::clone(&task_senders);

            tokio::spawn(async move {
                let callback = move |request: &Request, response: Response| {
                    let auth = request
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    headers.lock().push(auth);
                    Ok::<Response, ErrorResponse>(response)
                };

                let Ok(socket) = accept_hdr_async(stream, callback).await else {
                    return;
                };
                let (mut sink, mut stream) = socket.split();
                let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
                senders.lock().push(tx);

                loop {
                    tokio::select! {
                        outbound = rx.recv() => match outbound {
                            Some(message) => {
                                if sink.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                        inbound = stream.next() => match inbound {
                            Some(Ok(_)) => {}
                            _ => break,
                        },
                    }
                }
            });
        }
    });

    (format!("ws://{addr}"), auth_headers, senders)
}

fn channel_config(url: &str) -> ChannelConfig {
    ChannelConfig {
        url: url.to_string(),
        reconnect_base_ms: 50,
        reconnect_max_ms: 500,
    }
}

/// Push a text frame to the most recently connected client
fn push(senders: &Senders, text: &str) {
    let guard = senders.lock();
    let sender = guard.last().expect("no connected client");
    sender.send(Message::Text(text.to_string())).unwrap();
}

#[tokio::test]
async fn test_handshake_carries_bearer_token() {
    let backend = MockBackend::spawn().await.unwrap();
    let (ws_url, auth_headers, senders) = spawn_ws_server().await;

    let session = client_session(&backend.url, Arc::new(RecordingNavigator::default()));
    let pair = fresh_pair(Role::Owner);
    session.store().set_pair(&pair);

    let channel = SessionChannel::spawn(channel_config(&ws_url), Arc::clone(&session));

    let connected = wait_until(Duration::from_secs(3), || !senders.lock().is_empty()).await;
    assert!(connected, "channel never connected");

    assert_eq!(
        auth_headers.lock()[0],
        format!("Bearer {}", pair.access_token)
    );

    channel.shutdown().await;
}

#[tokio::test]
async fn test_force_refresh_signal_renews_and_reconnects() {
    let backend = MockBackend::spawn().await.unwrap();
    let (ws_url, auth_headers, senders) = spawn_ws_server().await;

    let session = client_session(&backend.url, Arc::new(RecordingNavigator::default()));
    // Well within the threshold: only a forced refresh can renew this.
    let pair = fresh_pair(Role::Owner);
    session.store().set_pair(&pair);

    let channel = SessionChannel::spawn(channel_config(&ws_url), Arc::clone(&session));

    assert!(wait_until(Duration::from_secs(3), || !senders.lock().is_empty()).await);
    push(&senders, r#"{"event":"refresh-token"}"#);

    // The renewal happened despite the access token being fresh...
    assert!(
        wait_until(Duration::from_secs(3), || {
            backend.calls.refresh.load(Ordering::SeqCst) >= 1
        })
        .await,
        "forced refresh never reached the backend"
    );

    // ...the store rotated...
    assert!(
        wait_until(Duration::from_secs(3), || {
            session.store().get(TokenKind::Access).as_deref()
                != Some(pair.access_token.as_str())
        })
        .await
    );

    // ...and the channel re-authenticated with the new token.
    assert!(
        wait_until(Duration::from_secs(3), || auth_headers.lock().len() >= 2).await,
        "channel never reconnected after the refresh"
    );
    let new_access = session.store().get(TokenKind::Access).unwrap();
    assert_eq!(
        auth_headers.lock().last().unwrap(),
        &format!("Bearer {new_access}")
    );

    channel.shutdown().await;
}

#[tokio::test]
async fn test_logout_signal_ends_session() {
    let backend = MockBackend::spawn().await.unwrap();
    let (ws_url, _auth_headers, senders) = spawn_ws_server().await;

    let navigator = Arc::new(RecordingNavigator::default());
    let session = client_session(&backend.url, Arc::clone(&navigator));
    session.store().set_pair(&fresh_pair(Role::Owner));
    session.state().set_role(Role::Owner);

    let channel = SessionChannel::spawn(channel_config(&ws_url), Arc::clone(&session));

    assert!(wait_until(Duration::from_secs(3), || !senders.lock().is_empty()).await);
    push(&senders, r#"{"event":"logout"}"#);

    assert!(
        wait_until(Duration::from_secs(3), || !session.store().is_logged_in()).await,
        "logout signal never cleared the store"
    );
    assert_eq!(session.state().role(), None);
    assert_eq!(backend.calls.logout_total(), 1);
    // Backend revocation lands on the default route, not the login page.
    assert_eq!(navigator.visited(), vec!["/".to_string()]);

    channel.shutdown().await;
}

#[tokio::test]
async fn test_domain_events_forwarded_to_subscribers() {
    let backend = MockBackend::spawn().await.unwrap();
    let (ws_url, _auth_headers, senders) = spawn_ws_server().await;

    let session = client_session(&backend.url, Arc::new(RecordingNavigator::default()));
    session.store().set_pair(&fresh_pair(Role::Owner));

    let channel = SessionChannel::spawn(channel_config(&ws_url), Arc::clone(&session));
    let mut subscription = channel.subscribe();

    assert!(wait_until(Duration::from_secs(3), || !senders.lock().is_empty()).await);

    // Skip the Connected event.
    let connected = tokio::time::timeout(Duration::from_secs(3), subscription.next())
        .await
        .unwrap();
    assert_eq!(connected, Some(ChannelEvent::Connected));

    push(
        &senders,
        r#"{"event":"update-order","data":{"orderId":12,"status":"Delivered"}}"#,
    );

    let event = tokio::time::timeout(Duration::from_secs(3), subscription.next())
        .await
        .unwrap();
    match event {
        Some(ChannelEvent::OrderUpdated(data)) => {
            assert_eq!(data["orderId"], 12);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    channel.shutdown().await;
}

#[tokio::test]
async fn test_malformed_message_does_not_kill_the_listener() {
    let backend = MockBackend::spawn().await.unwrap();
    let (ws_url, _auth_headers, senders) = spawn_ws_server().await;

    let session = client_session(&backend.url, Arc::new(RecordingNavigator::default()));
    session.store().set_pair(&fresh_pair(Role::Owner));

    let channel = SessionChannel::spawn(channel_config(&ws_url), Arc::clone(&session));

    assert!(wait_until(Duration::from_secs(3), || !senders.lock().is_empty()).await);
    push(&senders, "not json at all");
    push(&senders, r#"{"event":"refresh-token"}"#);

    // The garbage frame was logged and skipped; the next signal still
    // lands.
    assert!(
        wait_until(Duration::from_secs(3), || {
            backend.calls.refresh.load(Ordering::SeqCst) >= 1
        })
        .await
    );

    channel.shutdown().await;
}
