//! Session channel client
//!
//! One task owns the websocket for the whole application lifetime. The
//! connection is authenticated at handshake time with the current access
//! token, so a successful refresh must tear the socket down and
//! re-establish it with the new token; the task observes the session event
//! hub for exactly that. Inbound signals funnel into the same deduplicated
//! coordinator entry points the scheduler uses, so a channel-driven refresh
//! racing a timer-driven one collapses into a single network call.

use std::sync::Arc;
use std::time::Duration;

use dine_common::endpoints::pages;
use dine_common::ChannelConfig;
use dine_core::TokenKind;
use dine_session::{Session, SessionEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::protocol::{ChannelEvent, ChannelMessage};

/// Buffer for fan-out of channel events to subscribers
const EVENT_BUFFER_SIZE: usize = 64;

/// Control commands for the channel task
#[derive(Debug)]
enum Command {
    Reconnect,
    Shutdown,
}

/// What the inner read loop decided the outer loop should do next
enum LoopStep {
    Reconnect,
    Shutdown,
}

/// Handle to the running session channel
pub struct SessionChannel {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<ChannelEvent>,
    handle: JoinHandle<()>,
}

impl SessionChannel {
    /// Spawn the channel task
    #[must_use]
    pub fn spawn(config: ChannelConfig, session: Arc<Session>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (events_tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);

        let task_events = events_tx.clone();
        let handle = tokio::spawn(async move {
            run(config, session, task_events, cmd_rx).await;
        });

        Self {
            cmd_tx,
            events_tx,
            handle,
        }
    }

    /// Subscribe to channel events; dropping the handle unsubscribes
    #[must_use]
    pub fn subscribe(&self) -> ChannelSubscription {
        ChannelSubscription {
            rx: self.events_tx.subscribe(),
        }
    }

    /// Tear down the current socket and reconnect with the current token
    pub async fn reconnect(&self) {
        let _ = self.cmd_tx.send(Command::Reconnect).await;
    }

    /// Stop the channel task for good
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
    }

    /// Whether the channel task has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for SessionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionChannel")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

/// Subscription handle over the channel event stream
#[derive(Debug)]
pub struct ChannelSubscription {
    rx: broadcast::Receiver<ChannelEvent>,
}

impl ChannelSubscription {
    /// Wait for the next channel event
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Channel event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

async fn run(
    config: ChannelConfig,
    session: Arc<Session>,
    events_tx: broadcast::Sender<ChannelEvent>,
    mut cmd_rx: mpsc::Receiver<Command>,
) {
    let mut backoff = Backoff::new(
        Duration::from_millis(config.reconnect_base_ms),
        Duration::from_millis(config.reconnect_max_ms),
    );
    let mut session_events = session.events().subscribe();

    loop {
        // Without an access token there is nothing to authenticate the
        // handshake with; wait for the session to change.
        let Some(access_token) = session.store().get(TokenKind::Access) else {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Reconnect) => continue,
                    Some(Command::Shutdown) | None => return,
                },
                event = session_events.next() => match event {
                    Some(_) => continue,
                    None => return,
                },
            }
        };

        let request = match build_request(&config.url, &access_token) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid channel request");
                tokio::time::sleep(backoff.next_delay()).await;
                continue;
            }
        };

        let socket = match tokio_tungstenite::connect_async(request).await {
            Ok((socket, _response)) => socket,
            Err(e) => {
                warn!(error = %e, attempt = backoff.attempt(), "Channel connect failed");
                tokio::time::sleep(backoff.next_delay()).await;
                continue;
            }
        };

        backoff.reset();
        info!(url = %config.url, "Channel connected");
        let _ = events_tx.send(ChannelEvent::Connected);

        let step = read_loop(
            socket,
            &session,
            &events_tx,
            &mut cmd_rx,
            &mut session_events,
        )
        .await;

        let _ = events_tx.send(ChannelEvent::Disconnected);
        info!("Channel disconnected");

        match step {
            LoopStep::Shutdown => return,
            LoopStep::Reconnect => {
                tokio::time::sleep(backoff.next_delay()).await;
            }
        }
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Drive one established socket until it needs to be torn down
async fn read_loop(
    socket: WsStream,
    session: &Arc<Session>,
    events_tx: &broadcast::Sender<ChannelEvent>,
    cmd_rx: &mut mpsc::Receiver<Command>,
    session_events: &mut dine_session::EventSubscription,
) -> LoopStep {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_signal(session, events_tx, &text).await;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Server closed the channel");
                    return LoopStep::Reconnect;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Channel read error");
                    return LoopStep::Reconnect;
                }
            },
            cmd = cmd_rx.recv() => {
                let _ = sink.close().await;
                return match cmd {
                    Some(Command::Reconnect) => LoopStep::Reconnect,
                    Some(Command::Shutdown) | None => LoopStep::Shutdown,
                };
            },
            event = session_events.next() => match event {
                // The handshake token is fixed at connect time; a renewed
                // pair requires a fresh handshake.
                Some(SessionEvent::TokensRefreshed) => {
                    info!("Token pair renewed; reconnecting channel");
                    let _ = sink.close().await;
                    return LoopStep::Reconnect;
                }
                Some(SessionEvent::SessionEnded(reason)) => {
                    info!(reason = ?reason, "Session ended; closing channel");
                    let _ = sink.close().await;
                    return LoopStep::Reconnect;
                }
                None => return LoopStep::Shutdown,
            },
        }
    }
}

/// React to one inbound message; a malformed or unknown message is logged
/// and never unregisters the listener
async fn handle_signal(
    session: &Arc<Session>,
    events_tx: &broadcast::Sender<ChannelEvent>,
    text: &str,
) {
    match ChannelMessage::from_json(text) {
        Ok(ChannelMessage::RefreshToken) => {
            // Funnels through the same dedup as the scheduler tick.
            let outcome = session.refresh().check_and_refresh(true).await;
            debug!(outcome = ?outcome, "Channel-forced refresh settled");
        }
        Ok(ChannelMessage::Logout) => {
            // Backend revoked the session; land on the default route.
            session.logout().force_logout_to(pages::DEFAULT).await;
        }
        Ok(ChannelMessage::UpdateOrder(data)) => {
            let _ = events_tx.send(ChannelEvent::OrderUpdated(data));
        }
        Ok(ChannelMessage::Payment(data)) => {
            let _ = events_tx.send(ChannelEvent::PaymentReceived(data));
        }
        Err(e) => {
            debug!(error = %e, "Unrecognized channel message");
        }
    }
}

fn build_request(
    url: &str,
    access_token: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, anyhow::Error> {
    let mut request = url.into_client_request()?;
    request
        .headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {access_token}").parse()?);
    Ok(request)
}
