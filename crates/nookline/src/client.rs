//! `GameClient`: wires the connection, world, challenge, and battle layers.
//!
//! One dispatch task subscribes to the connection manager, decodes each
//! inbound frame once, and routes it to the owning component:
//!
//! ```text
//! socket frames ──→ playerUpdate / gameState / playerDisconnect ──→ entity store
//!                   challenge_*                                 ──→ challenge tracker
//!                   fight_start                                 ──→ battle engine
//! ```
//!
//! Everything the host needs to render flows back out as [`GameEvent`]s
//! plus the pollable entity store. Dropping the client tears down the
//! dispatch task, the battle driver, and the connection actor — pending
//! timers included.

use std::sync::Arc;

use nookline_battle::{BattleEngine, BattleEvents, BattleSnapshot, BattleTiming, Combatant};
use nookline_duel::{ChallengeState, ChallengeTracker};
use nookline_protocol::{Animation, ClientFrame, FighterPayload, PlayerState, ServerFrame};
use nookline_session::{
    ConnectionManager, Dialer, SessionConfig, SessionEvents, Subscription,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{EntityEvent, GameEvent, GameEvents, NooklineError};
use nookline_world::RemoteEntityStore;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything needed to bring the client core up.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Game server endpoint, e.g. `ws://localhost:6789`.
    pub endpoint: String,
    /// Our own username (as issued by the login collaborator).
    pub username: String,
    /// Auth token from login; sent as the first frame on every socket.
    pub token: Option<String>,
    /// Reconnection policy.
    pub session: SessionConfig,
    /// Battle presentation pacing.
    pub timing: BattleTiming,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            token: None,
            session: SessionConfig::default(),
            timing: BattleTiming::default(),
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn timing(mut self, timing: BattleTiming) -> Self {
        self.timing = timing;
        self
    }
}

// ---------------------------------------------------------------------------
// GameClient
// ---------------------------------------------------------------------------

/// Handle to the running client core.
pub struct GameClient {
    username: String,
    conn: ConnectionManager,
    world: Arc<Mutex<RemoteEntityStore>>,
    challenges: Arc<Mutex<ChallengeTracker>>,
    battle: Arc<Mutex<Option<BattleEngine>>>,
    dispatch: Option<tokio::task::JoinHandle<()>>,
}

impl GameClient {
    /// Connects over WebSocket. Dial failures feed the reconnect path and
    /// surface as [`GameEvent::Session`] events, never as an error here.
    pub fn connect(config: ClientConfig) -> (Self, GameEvents) {
        Self::connect_with(nookline_session::WebSocketDialer, config)
    }

    /// Connects with a custom dialer (tests use a scripted in-memory one).
    pub fn connect_with<D: Dialer>(dialer: D, config: ClientConfig) -> (Self, GameEvents) {
        let (conn, session_events) = ConnectionManager::connect(
            dialer,
            config.endpoint.clone(),
            config.token.clone(),
            config.session.clone(),
        );
        // The manager was just created; subscribing cannot fail yet.
        let subscription = conn
            .subscribe()
            .expect("subscribe on a freshly spawned manager");

        let world = Arc::new(Mutex::new(RemoteEntityStore::new()));
        let challenges = Arc::new(Mutex::new(ChallengeTracker::new(config.username.clone())));
        let battle = Arc::new(Mutex::new(None));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            username: config.username.clone(),
            timing: config.timing,
            world: Arc::clone(&world),
            challenges: Arc::clone(&challenges),
            battle: Arc::clone(&battle),
            event_tx,
        };
        let dispatch = tokio::spawn(dispatcher.run(subscription, session_events));

        info!(username = %config.username, endpoint = %config.endpoint, "game client started");

        (
            Self {
                username: config.username,
                conn,
                world,
                challenges,
                battle,
                dispatch: Some(dispatch),
            },
            event_rx,
        )
    }

    /// Our own username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether the socket has completed the auth handshake.
    pub fn is_authenticated(&self) -> bool {
        self.conn.is_authenticated()
    }

    // -- Movement -----------------------------------------------------------

    /// Reports our avatar's position and pose. Queued while the handshake
    /// is pending, like every outbound frame.
    pub fn send_position(
        &self,
        x: f32,
        y: f32,
        animation: Animation,
        flip_x: bool,
        scale: f32,
    ) -> Result<(), NooklineError> {
        self.conn.send(ClientFrame::PlayerUpdate {
            x,
            y,
            animation,
            flip_x,
            scale,
        })?;
        Ok(())
    }

    // -- Challenges -----------------------------------------------------------

    /// Challenges `target` to a fight.
    pub fn challenge(&self, target: &str) -> Result<(), NooklineError> {
        let frame = self.challenges.lock().initiate(target)?;
        self.conn.send(frame)?;
        Ok(())
    }

    /// Accepts the pending incoming challenge. The battle itself starts
    /// when the server's `fight_start` arrives.
    pub fn accept_challenge(&self) -> Result<(), NooklineError> {
        let frame = self.challenges.lock().accept()?;
        self.conn.send(frame)?;
        Ok(())
    }

    /// Declines the pending incoming challenge.
    pub fn decline_challenge(&self) -> Result<(), NooklineError> {
        let frame = self.challenges.lock().decline()?;
        self.conn.send(frame)?;
        Ok(())
    }

    /// Withdraws our outstanding challenge.
    pub fn cancel_challenge(&self) -> Result<(), NooklineError> {
        let frame = self.challenges.lock().cancel()?;
        self.conn.send(frame)?;
        Ok(())
    }

    // -- Fights -----------------------------------------------------------

    /// Requests kickoff of an agreed fight with `opponent`.
    pub fn start_fight(&self, opponent: &str) -> Result<(), NooklineError> {
        self.conn.send(ClientFrame::FightStart {
            from: self.username.clone(),
            to: opponent.into(),
        })?;
        Ok(())
    }

    /// Aborts an agreed or running fight: tells the other side, stops any
    /// local battle driver, and frees the challenge slot.
    pub fn cancel_fight(&self, opponent: &str) -> Result<(), NooklineError> {
        self.conn.send(ClientFrame::FightCancel {
            from: self.username.clone(),
            to: opponent.into(),
        })?;
        if let Some(mut engine) = self.battle.lock().take() {
            engine.abort();
        }
        self.challenges.lock().reset();
        Ok(())
    }

    // -- Observation --------------------------------------------------------

    /// The shared entity store. The render loop locks it each frame to
    /// call `tick()` and read positions.
    pub fn world(&self) -> Arc<Mutex<RemoteEntityStore>> {
        Arc::clone(&self.world)
    }

    /// Current challenge slot state.
    pub fn challenge_state(&self) -> ChallengeState {
        self.challenges.lock().state().clone()
    }

    /// Latest snapshot of the running battle, if one is in progress.
    pub fn battle_snapshot(&self) -> Option<BattleSnapshot> {
        self.battle.lock().as_ref().map(BattleEngine::snapshot)
    }

    /// Gracefully stops dispatch, any running battle, and the connection.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        if let Some(mut engine) = self.battle.lock().take() {
            engine.abort();
        }
        self.conn.shutdown().await;
        info!("game client shut down");
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        // The connection actor and battle driver abort via their own Drop.
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The routing task: one decoded frame in, zero or more events out.
struct Dispatcher {
    username: String,
    timing: BattleTiming,
    world: Arc<Mutex<RemoteEntityStore>>,
    challenges: Arc<Mutex<ChallengeTracker>>,
    battle: Arc<Mutex<Option<BattleEngine>>>,
    event_tx: mpsc::UnboundedSender<GameEvent>,
}

impl Dispatcher {
    async fn run(self, subscription: Subscription, session_events: SessionEvents) {
        let mut frames = Some(subscription);
        let mut session = Some(session_events);
        let mut battle_events: Option<BattleEvents> = None;

        loop {
            tokio::select! {
                frame = next_frame(&mut frames) => {
                    if let Some(frame) = frame {
                        self.handle_frame(frame, &mut battle_events);
                    }
                    // A closed subscription leaves battles running; the
                    // loop ends when the host drops the event stream.
                }
                event = next_item(&mut session) => {
                    if let Some(event) = event {
                        self.emit(GameEvent::Session(event));
                    }
                }
                battle_event = next_item(&mut battle_events) => {
                    if let Some(event) = battle_event {
                        let terminal = event.phase.is_terminal();
                        self.emit(GameEvent::BattlePhase(event));
                        if terminal {
                            // The slot frees for a rematch; the engine
                            // handle stays for late snapshot reads.
                            self.challenges.lock().reset();
                            battle_events = None;
                        }
                    }
                }
            }

            if self.event_tx.is_closed() {
                debug!("event stream dropped, dispatch stopping");
                return;
            }
            if frames.is_none() && session.is_none() && battle_events.is_none() {
                debug!("all sources closed, dispatch stopping");
                return;
            }
        }
    }

    fn handle_frame(&self, frame: ServerFrame, battle_events: &mut Option<BattleEvents>) {
        match frame {
            ServerFrame::PlayerUpdate {
                username,
                x,
                y,
                animation,
                flip_x,
                scale,
            } => {
                // The server shouldn't echo our own updates back, but the
                // reference client guards against it anyway.
                if username != self.username {
                    let state = PlayerState {
                        x,
                        y,
                        animation,
                        flip_x,
                        scale,
                    };
                    self.world.lock().apply_update(&username, &state);
                    self.emit(GameEvent::Entity(EntityEvent::Updated { username, state }));
                }
            }

            ServerFrame::GameState { players, map } => {
                // The map path is the renderer's business; the peers are ours.
                debug!(%map, players = players.len(), "world snapshot received");
                let mut world = self.world.lock();
                for (username, state) in players {
                    if username != self.username {
                        world.apply_update(&username, &state);
                        self.emit(GameEvent::Entity(EntityEvent::Updated { username, state }));
                    }
                }
            }

            ServerFrame::PlayerDisconnect { username } => {
                if self.world.lock().remove(&username) {
                    self.emit(GameEvent::Entity(EntityEvent::Removed { username }));
                }
            }

            frame @ (ServerFrame::ChallengeRequest { .. }
            | ServerFrame::ChallengeAccept { .. }
            | ServerFrame::ChallengeDecline { .. }
            | ServerFrame::ChallengeCancel { .. }
            | ServerFrame::ChallengeResponse { .. }) => {
                if let Some(challenge) = self.challenges.lock().on_frame(&frame) {
                    self.emit(GameEvent::Challenge(challenge));
                }
                if let ServerFrame::ChallengeResponse {
                    success: false,
                    message,
                } = frame
                {
                    self.emit(GameEvent::Notice(message));
                }
            }

            ServerFrame::FightStart { player1, player2 } => {
                self.start_battle(player1, player2, battle_events);
            }

            ServerFrame::FightStartError { message } => {
                self.challenges.lock().reset();
                self.emit(GameEvent::Notice(message));
            }

            ServerFrame::FightCancel { from, .. } => {
                if let Some(mut engine) = self.battle.lock().take() {
                    engine.abort();
                }
                self.challenges.lock().reset();
                self.emit(GameEvent::Notice(format!("{from} cancelled the fight.")));
            }
        }
    }

    /// Builds combatants from the kickoff payload and starts the driver.
    /// `player1` is the challenger on both clients, so both ends compute
    /// the identical battle from the identical payload.
    fn start_battle(
        &self,
        player1: FighterPayload,
        player2: FighterPayload,
        battle_events: &mut Option<BattleEvents>,
    ) {
        let opponent = if player1.username == self.username {
            player2.username.clone()
        } else {
            player1.username.clone()
        };

        let c1 = Combatant::from_payload(&player1);
        let c2 = Combatant::from_payload(&player2);
        let (engine, events) = BattleEngine::spawn(c1, c2, self.timing.clone());

        // A kickoff while a battle is running replaces it; the old driver
        // aborts when its engine handle drops.
        *self.battle.lock() = Some(engine);
        *battle_events = Some(events);

        info!(%opponent, "fight started");
        self.emit(GameEvent::Notice(format!("Fight started with {opponent}!")));
    }

    fn emit(&self, event: GameEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Receives from an optional subscription, parking the slot once closed
/// so the `select!` branch goes dormant instead of spinning.
async fn next_frame(slot: &mut Option<Subscription>) -> Option<ServerFrame> {
    let Some(subscription) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let frame = subscription.recv().await;
    if frame.is_none() {
        *slot = None;
    }
    frame
}

/// Same parking pattern for plain mpsc receivers.
async fn next_item<T>(slot: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    let Some(rx) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let item = rx.recv().await;
    if item.is_none() {
        *slot = None;
    }
    item
}
