//! Watch session: one set of pollers bound to one outbound connection.
//!
//! A [`WatchSession`] owns a poller per watched kind, the sink they share
//! and a single [`CancellationToken`] used as the shutdown signal. Its
//! supervisor task spawns the pollers, handles in-band commands, and turns
//! any escalated poller failure into a session-wide shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start()──▶ Running ──stop() / failure / disconnect──▶ Stopping ──drained──▶ Stopped
//!    └───────────────────────stop() before start()───────────────────────────────────────▲
//! ```
//!
//! Transitions only move forward, so stopping twice is a no-op and nothing
//! leaves `Stopped`.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::poller::ResourcePoller;
use super::retry::RetryPolicy;
use super::sink::EventSink;
use crate::domain::{SessionId, SessionState, SessionSummary, WatchedKind};
use crate::error::WatchError;
use crate::upstream::ResourceSource;

/// Control message delivered to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start following an additional kind, typically one resource by ID.
    Watch(WatchedKind),
}

/// Why a session stopped. Recorded once, by whichever trigger came first.
#[derive(Debug, Clone)]
pub enum StopReason {
    /// `stop()` was called explicitly.
    Requested,
    /// The peer closed the connection.
    ClientDisconnected,
    /// A poller or the sink failed.
    Failed(Arc<WatchError>),
}

impl StopReason {
    /// Returns `true` for [`StopReason::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("stop requested"),
            Self::ClientDisconnected => f.write_str("client disconnected"),
            Self::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// A set of concurrently running pollers feeding one sink.
#[derive(Debug)]
pub struct WatchSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    source: Arc<dyn ResourceSource>,
    sink: Arc<dyn EventSink>,
    retry: RetryPolicy,
    initial: Vec<WatchedKind>,
    watching: RwLock<Vec<WatchedKind>>,
    shutdown: CancellationToken,
    state: watch::Sender<SessionState>,
    reason: OnceLock<StopReason>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<SessionCommand>>>,
}

impl WatchSession {
    /// Creates a session in [`SessionState::Created`] that will watch the
    /// default collections once started.
    #[must_use]
    pub fn new(
        source: Arc<dyn ResourceSource>,
        sink: Arc<dyn EventSink>,
        retry: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Created);
        let (commands, command_rx) = mpsc::unbounded_channel();
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            source,
            sink,
            retry,
            initial: WatchedKind::defaults(),
            watching: RwLock::new(Vec::new()),
            shutdown: CancellationToken::new(),
            state,
            reason: OnceLock::new(),
            commands,
            command_rx: Mutex::new(Some(command_rx)),
        }
    }

    /// Replaces the kinds spawned by [`WatchSession::start`].
    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<WatchedKind>) -> Self {
        self.initial = kinds;
        self
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Why the session stopped, once it has been told to.
    #[must_use]
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.reason.get()
    }

    /// Spawns one poller per configured kind and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::AlreadyStarted`] if the session is running, or
    /// [`WatchError::SessionClosed`] if it was stopped before starting.
    pub fn start(self: &Arc<Self>) -> Result<(), WatchError> {
        let mut observed = SessionState::Created;
        let started = self.state.send_if_modified(|state| {
            observed = *state;
            if *state == SessionState::Created {
                *state = SessionState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(match observed {
                SessionState::Running => WatchError::AlreadyStarted,
                _ => WatchError::SessionClosed,
            });
        }

        let command_rx = self
            .command_rx
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or_else(|| WatchError::Internal("command receiver already taken".to_string()))?;

        tokio::spawn(Arc::clone(self).supervise(command_rx));
        Ok(())
    }

    /// Signals every poller to terminate. Does not wait for them.
    pub fn stop(&self) {
        self.halt(StopReason::Requested);
    }

    /// Stops the session because the peer went away.
    pub fn disconnect(&self) {
        self.halt(StopReason::ClientDisconnected);
    }

    /// Stops the session because of a fatal failure.
    pub fn fail(&self, error: WatchError) {
        tracing::error!(session_id = %self.id, %error, "watch session failed");
        self.halt(StopReason::Failed(Arc::new(error)));
    }

    /// Delivers a control message to the running session.
    ///
    /// Receipt is acknowledged by returning `Ok`; the command is applied
    /// asynchronously by the supervisor.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::SessionClosed`] once shutdown has been signaled.
    pub fn command(&self, command: SessionCommand) -> Result<(), WatchError> {
        if self.shutdown.is_cancelled() {
            return Err(WatchError::SessionClosed);
        }
        self.commands
            .send(command)
            .map_err(|_| WatchError::SessionClosed)
    }

    /// Resolves once the session reaches [`SessionState::Stopped`].
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == SessionState::Stopped).await;
    }

    /// Resolves once shutdown has been signaled, before pollers drain.
    pub async fn stopping(&self) {
        self.shutdown.cancelled().await;
    }

    /// Snapshot for the REST endpoints.
    pub async fn summary(&self) -> SessionSummary {
        let watching = self.watching.read().await;
        SessionSummary {
            session_id: self.id,
            state: self.state(),
            watching: watching.iter().map(ToString::to_string).collect(),
            created_at: self.created_at,
        }
    }

    fn halt(&self, reason: StopReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!(
                session_id = %self.id,
                reason = %self.describe_reason(),
                "stopping watch session"
            );
        }
        self.shutdown.cancel();
        self.state.send_if_modified(|state| match *state {
            // Nothing was spawned, so there is nothing to drain.
            SessionState::Created => {
                *state = SessionState::Stopped;
                true
            }
            SessionState::Running => {
                *state = SessionState::Stopping;
                true
            }
            SessionState::Stopping | SessionState::Stopped => false,
        });
    }

    fn advance(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        });
    }

    fn describe_reason(&self) -> String {
        self.reason
            .get()
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    }

    async fn supervise(self: Arc<Self>, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        let mut pollers = JoinSet::new();
        let mut watched = HashSet::new();

        for kind in self.initial.clone() {
            self.spawn_poller(&mut pollers, &mut watched, kind).await;
        }
        tracing::info!(session_id = %self.id, pollers = pollers.len(), "watch session running");

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                Some(command) = commands.recv() => {
                    self.apply(command, &mut pollers, &mut watched).await;
                }
                Some(joined) = pollers.join_next() => match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => self.fail(error),
                    Err(join_error) => self.fail(WatchError::Internal(join_error.to_string())),
                },
            }
        }

        self.advance(SessionState::Stopping);
        while let Some(joined) = pollers.join_next().await {
            if let Ok(Err(error)) = joined {
                tracing::debug!(session_id = %self.id, %error, "poller exited with error during drain");
            }
        }
        self.advance(SessionState::Stopped);
        tracing::info!(
            session_id = %self.id,
            reason = %self.describe_reason(),
            "watch session stopped"
        );
    }

    async fn apply(
        &self,
        command: SessionCommand,
        pollers: &mut JoinSet<Result<(), WatchError>>,
        watched: &mut HashSet<WatchedKind>,
    ) {
        tracing::info!(session_id = %self.id, ?command, "command received");
        match command {
            SessionCommand::Watch(kind) => {
                if watched.contains(&kind) {
                    tracing::debug!(session_id = %self.id, %kind, "already watching");
                    return;
                }
                self.spawn_poller(pollers, watched, kind).await;
            }
        }
    }

    async fn spawn_poller(
        &self,
        pollers: &mut JoinSet<Result<(), WatchError>>,
        watched: &mut HashSet<WatchedKind>,
        kind: WatchedKind,
    ) {
        let poller = ResourcePoller::new(
            kind.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            self.retry,
        );
        pollers.spawn(poller.run(self.shutdown.clone()));
        watched.insert(kind.clone());
        self.watching.write().await.push(kind);
    }
}
