mod message;
mod state;

use std::pin::Pin;
use tokio::select;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep, Duration, Instant, Sleep};
use tracing::{debug, error, info, warn};

use crate::config::RecoveryConfig;
use crate::scene::SceneDirector;
use crate::transport::{DisconnectCause, JoinFailure, SessionTransport, TransportEvent};

use message::RecoveryMessage;
pub use state::{RecoverySnapshot, RecoveryState};

/// Handle to the session recovery controller.
///
/// The controller tracks whether the local player is inside a session and,
/// after an unexpected disconnect, drives a bounded rejoin loop against the
/// transport. When recovery is exhausted or the session is gone it returns
/// the player to the lobby context instead.
#[derive(Clone)]
pub struct RecoveryHandle {
    sender: mpsc::Sender<RecoveryMessage>,
    recovering: watch::Receiver<bool>,
}

impl RecoveryHandle {
    pub fn new(
        config: RecoveryConfig,
        transport: impl SessionTransport,
        scenes: impl SceneDirector,
    ) -> Self {
        let (sender, mailbox) = mpsc::channel::<RecoveryMessage>(10);
        let (overlay, recovering) = watch::channel(false);
        let actor = RecoveryActor::new(mailbox, config, transport, scenes, overlay);
        tokio::spawn(run_recovery(actor));

        Self { sender, recovering }
    }

    /// Pump a transport subscription into this controller's mailbox.
    pub fn attach(&self, mut events: broadcast::Receiver<TransportEvent>) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let forwarded = sender.send(RecoveryMessage::TransportEvent(event)).await;
                        if forwarded.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "transport event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    pub async fn transport_event(&self, event: TransportEvent) {
        self.sender
            .send(RecoveryMessage::TransportEvent(event))
            .await
            .expect("be able to deliver transport event");
    }

    /// Request a disconnect on behalf of the player. Must run before the
    /// transport reports the drop so the disconnect is attributed as expected
    /// and no recovery starts.
    pub async fn manual_disconnect(&self) {
        self.sender
            .send(RecoveryMessage::ManualDisconnect)
            .await
            .expect("be able to request manual disconnect");
    }

    /// Whether the blocking "reconnecting" overlay should be visible.
    pub fn recovering(&self) -> bool {
        *self.recovering.borrow()
    }

    /// Signal UIs can watch to drive the blocking overlay.
    pub fn recovering_signal(&self) -> watch::Receiver<bool> {
        self.recovering.clone()
    }

    pub async fn snapshot(&self) -> RecoverySnapshot {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(RecoveryMessage::Snapshot(sender))
            .await
            .expect("be able to request a snapshot");
        receiver.await.expect("to receive a snapshot")
    }
}

struct RecoveryActor<T, D> {
    mailbox: mpsc::Receiver<RecoveryMessage>,
    config: RecoveryConfig,
    transport: T,
    scenes: D,
    state: RecoveryState,
    in_session: bool,
    attempts: u32,
    manual_disconnect: bool,
    overlay: watch::Sender<bool>,
    retry_timer: Pin<Box<Sleep>>,
    retry_armed: bool,
}

impl<T: SessionTransport, D: SceneDirector> RecoveryActor<T, D> {
    fn new(
        mailbox: mpsc::Receiver<RecoveryMessage>,
        config: RecoveryConfig,
        transport: T,
        scenes: D,
        overlay: watch::Sender<bool>,
    ) -> RecoveryActor<T, D> {
        let retry_timer = sleep(Duration::from_secs(config.retry_interval));
        Self {
            mailbox,
            config,
            transport,
            scenes,
            state: RecoveryState::Idle,
            in_session: false,
            attempts: 0,
            manual_disconnect: false,
            overlay,
            retry_timer: Box::pin(retry_timer),
            retry_armed: false,
        }
    }

    async fn on_joined_session(&mut self) {
        self.in_session = true;
        if self.state.is_recovering() {
            info!(attempts = self.attempts, "session recovered");
            self.state = RecoveryState::Idle;
            self.attempts = 0;
            self.retry_armed = false;
            self.overlay.send_replace(false);
        }
        self.manual_disconnect = false;
    }

    fn on_left_session(&mut self) {
        if !self.manual_disconnect {
            debug!("left the session");
            self.in_session = false;
        }
    }

    async fn on_disconnected(&mut self, cause: DisconnectCause) {
        if self.state.is_recovering() {
            debug!(?cause, "disconnected again while recovering, ignoring");
            return;
        }

        if self.in_session && !self.manual_disconnect {
            warn!(?cause, "unexpected disconnect during a session, starting recovery");
            self.start_recovery().await;
        } else {
            debug!(?cause, "disconnect does not qualify for recovery");
            self.in_session = false;
        }
    }

    async fn on_join_failed(&mut self, failure: JoinFailure) {
        if !self.state.is_recovering() {
            debug!(?failure, "join failed outside of recovery");
            return;
        }

        if failure.is_terminal() {
            warn!(?failure, "session is gone, abandoning recovery");
            self.abandon_recovery().await;
        } else {
            warn!(
                ?failure,
                interval = self.config.retry_interval,
                "transient join failure, retrying after delay"
            );
            self.arm_retry();
        }
    }

    async fn on_connected_to_directory(&mut self) {
        if self.state.is_recovering() {
            debug!("directory connection restored, reissuing rejoin");
            self.issue_rejoin().await;
        }
    }

    async fn on_manual_disconnect(&mut self) {
        debug!("manual disconnect requested");
        self.manual_disconnect = true;
        self.transport.disconnect().await;
    }

    async fn start_recovery(&mut self) {
        self.state = RecoveryState::Recovering;
        self.attempts = 0;
        self.overlay.send_replace(true);
        self.issue_rejoin().await;
    }

    /// Fire a rejoin request at the transport without consuming an attempt.
    /// The initial rejoin on entering recovery and the reissue after a
    /// directory reconnect are free; only timer-driven retries count.
    async fn issue_rejoin(&mut self) {
        if !self.transport.rejoin_last_session().await {
            error!("rejoin request could not be issued");
            self.arm_retry();
        }
    }

    async fn attempt_rejoin(&mut self) {
        self.attempts += 1;
        debug!(
            attempt = self.attempts,
            max = self.config.max_attempts,
            "retrying rejoin"
        );

        if self.attempts > self.config.max_attempts {
            warn!("rejoin attempts exhausted, returning to the lobby");
            self.abandon_recovery().await;
            return;
        }

        self.issue_rejoin().await;
    }

    async fn abandon_recovery(&mut self) {
        self.state = RecoveryState::Idle;
        self.attempts = 0;
        self.manual_disconnect = false;
        self.in_session = false;
        self.retry_armed = false;
        self.overlay.send_replace(false);

        if self.transport.is_connected().await {
            debug!("leaving the current session");
            self.transport.leave_session().await;
        }

        self.scenes.load_lobby().await;

        if !self.transport.is_connected().await {
            debug!("reconnecting to the directory");
            self.transport.connect().await;
        }
    }

    fn arm_retry(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(self.config.retry_interval);
        self.retry_timer.as_mut().reset(deadline);
        self.retry_armed = true;
    }

    fn snapshot(&self) -> RecoverySnapshot {
        RecoverySnapshot {
            state: self.state,
            in_session: self.in_session,
            attempts: self.attempts,
            manual_disconnect: self.manual_disconnect,
        }
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectedToDirectory => self.on_connected_to_directory().await,
            TransportEvent::JoinedSession => self.on_joined_session().await,
            TransportEvent::LeftSession => self.on_left_session(),
            TransportEvent::Disconnected(cause) => self.on_disconnected(cause).await,
            TransportEvent::JoinFailed(failure) => self.on_join_failed(failure).await,
            _ => {
                // lobby-facing events, handled by the lobby controller
            }
        }
    }

    async fn handle(&mut self, message: RecoveryMessage) {
        match message {
            RecoveryMessage::TransportEvent(event) => {
                self.on_transport_event(event).await;
            }
            RecoveryMessage::ManualDisconnect => {
                self.on_manual_disconnect().await;
            }
            RecoveryMessage::Snapshot(responder) => {
                responder
                    .send(self.snapshot())
                    .expect("be able to respond with a snapshot");
            }
        }
    }
}

async fn run_recovery<T, D>(mut actor: RecoveryActor<T, D>)
where
    T: SessionTransport,
    D: SceneDirector,
{
    loop {
        let next_message = actor.mailbox.recv();

        select! {
            next = next_message => {
                match next {
                    Some(msg) => {
                        actor.handle(msg).await
                    }
                    None => break,
                }
            }
            () = &mut actor.retry_timer.as_mut(), if actor.retry_armed => {
                actor.retry_armed = false;
                debug!("retry interval elapsed");
                actor.attempt_rejoin().await;
            }
        }
    }

    debug!("recovery controller is shutting down")
}
