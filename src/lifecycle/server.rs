//! Server session tracking

use super::WorldState;
use chrono::{DateTime, Utc};
use strum_macros::Display;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Inactive,
    Starting,
    Active,
    Stopping,
}

/// Published to subscribers on every session transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Starting(Uuid),
    Active(Uuid),
    Stopping(Uuid),
    Stopped(Uuid),
}

/// The active server lifetime, from AboutToStart until Stopped
pub struct ServerSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    world: Box<dyn WorldState>,
}

impl ServerSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Tracks whether a server session is active
///
/// ```text
/// Inactive ──start──▶ Starting ──activate──▶ Active
///     ▲                  │                     │
///     │                  └──────begin_stop─────┤
///     │                                        ▼
///     └───────────────stop─────────────────  Stopping
/// ```
///
/// Every transition from the wrong state is a no-op that returns `false`.
/// At most one session exists at a time.
pub struct ServerLifecycleManager {
    state: SessionState,
    session: Option<ServerSession>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for ServerLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLifecycleManager {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: SessionState::Inactive,
            session: None,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&ServerSession> {
        self.session.as_ref()
    }

    /// Session start/stop notifications for dependent subsystems
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Inactive → Starting, opening a session around `world`
    pub fn start(&mut self, world: Box<dyn WorldState>) -> bool {
        if self.state != SessionState::Inactive {
            tracing::warn!("Server session start ignored while {}", self.state);
            return false;
        }
        let session = ServerSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            world,
        };
        tracing::debug!("Server session {} starting", session.id);
        self.publish(SessionEvent::Starting(session.id));
        self.session = Some(session);
        self.state = SessionState::Starting;
        true
    }

    /// Starting → Active
    pub fn activate(&mut self) -> bool {
        let Some(id) = self.session_id() else {
            return false;
        };
        if self.state != SessionState::Starting {
            return false;
        }
        self.state = SessionState::Active;
        self.publish(SessionEvent::Active(id));
        true
    }

    /// Active or Starting → Stopping; notifies world state
    pub fn begin_stop(&mut self) -> bool {
        if !matches!(self.state, SessionState::Active | SessionState::Starting) {
            tracing::debug!("No server session to stop");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.world.on_server_stopping();
        let id = session.id;
        self.state = SessionState::Stopping;
        self.publish(SessionEvent::Stopping(id));
        true
    }

    /// Any live state → Inactive; notifies and drops world state
    ///
    /// A no-op from Inactive.
    pub fn stop(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            self.state = SessionState::Inactive;
            return false;
        };
        session.world.on_server_stopped();
        self.state = SessionState::Inactive;
        tracing::debug!("Server session {} stopped", session.id);
        self.publish(SessionEvent::Stopped(session.id));
        true
    }

    fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
