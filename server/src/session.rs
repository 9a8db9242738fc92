//! Session coordination: identity lifecycle, matchmaking, moves and match
//! teardown.
//!
//! All shared state lives in one [`Lobby`] behind one async mutex. Every
//! operation that reads and then mutates takes the lock once and does the
//! whole sequence inside it. Outbound sends are unbounded channel pushes, so
//! nothing awaits while the lock is held.

use crate::broadcast::{broadcast_presence, send_to, send_to_match};
use crate::config::ServerConfig;
use crate::game::TickOutcome;
use crate::matches::{MatchId, MatchTable};
use crate::names::NameGenerator;
use crate::registry::{Channel, ChannelId, IdentityId, Registry};
use log::{debug, info, warn};
use pong_shared::{ClientMessage, Direction, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Why a match stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The ball left the field.
    Boundary,
    /// One occupant went away.
    Disconnected { name: String },
}

impl EndReason {
    fn message(&self) -> String {
        match self {
            EndReason::Boundary => "Game over".to_string(),
            EndReason::Disconnected { name } => format!("Game over: {} disconnected", name),
        }
    }
}

/// Identity registry and match table, always mutated together.
#[derive(Debug, Default)]
pub struct Lobby {
    pub registry: Registry,
    pub matches: MatchTable,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            matches: MatchTable::new(),
        }
    }

    /// Registers a new connection, welcomes it and refreshes everyone's
    /// player list.
    pub fn connect(&mut self, channel: Channel, name: String) -> IdentityId {
        let id = self.registry.register(channel, name.clone()).id;
        send_to(&self.registry, id, ServerMessage::Welcome(name));
        broadcast_presence(&self.registry);
        id
    }

    /// Removes whoever owns `channel_id`. Unknown channels are ignored.
    pub fn disconnect(&mut self, channel_id: ChannelId) -> Option<IdentityId> {
        let id = self.registry.find_by_channel(channel_id)?.id;
        self.unregister(id);
        Some(id)
    }

    /// Removes an identity, ends its match if it has one, then refreshes the
    /// player list for whoever is left.
    pub fn unregister(&mut self, id: IdentityId) -> bool {
        let Some(identity) = self.registry.unregister(id) else {
            debug!("Unregister of unknown identity {}", id);
            return false;
        };

        if let Some(match_id) = self.matches.find_by_occupant(id).map(|m| m.id) {
            self.end_match(
                match_id,
                EndReason::Disconnected {
                    name: identity.name,
                },
            );
        }

        broadcast_presence(&self.registry);
        true
    }

    /// Binds `sender` and the identity called `target_name` into a new match.
    ///
    /// The challenger plays left, the target right. On any failure the sender
    /// gets an `error` message and nothing changes. On success both occupants
    /// get `start` and the caller receives the token the tick task must watch.
    pub fn challenge(
        &mut self,
        sender: IdentityId,
        target_name: &str,
    ) -> Option<(MatchId, CancellationToken)> {
        let Some(challenger) = self.registry.get(sender) else {
            debug!("Challenge from unknown identity {}", sender);
            return None;
        };

        if challenger.in_match {
            send_to(
                &self.registry,
                sender,
                ServerMessage::Error("You are already in a match".to_string()),
            );
            return None;
        }

        let target = match self.registry.find_by_name(target_name) {
            None => {
                info!("Identity {} challenged unknown player '{}'", sender, target_name);
                send_to(
                    &self.registry,
                    sender,
                    ServerMessage::Error(format!("Player {} not found", target_name)),
                );
                return None;
            }
            Some(target) if target.id == sender || target.in_match => {
                info!("Identity {} challenged unavailable player '{}'", sender, target_name);
                send_to(
                    &self.registry,
                    sender,
                    ServerMessage::Error(format!("Player {} is not available", target_name)),
                );
                return None;
            }
            Some(target) => target.id,
        };

        let match_id = match self.matches.create(sender, target, &mut self.registry) {
            Ok(match_id) => match_id,
            Err(e) => {
                warn!("Could not create match for {} vs {}: {}", sender, target, e);
                send_to(&self.registry, sender, ServerMessage::Error(e.to_string()));
                return None;
            }
        };

        let game = self.matches.find_by_match_id(match_id)?;
        let left_name = self.display_name(game.left);
        let right_name = self.display_name(game.right);
        send_to_match(
            &self.registry,
            game,
            ServerMessage::Start(format!("Match started: {} vs {}", left_name, right_name)),
        );

        Some((match_id, game.cancel.clone()))
    }

    /// Applies one paddle move for `sender` and pushes the new state out
    /// immediately, outside the tick cadence.
    pub fn handle_move(&mut self, sender: IdentityId, direction: Direction) {
        let Some(game) = self.matches.find_by_occupant_mut(sender) else {
            debug!("Move from identity {} which is not in a match", sender);
            return;
        };
        let Some(side) = game.side_of(sender) else {
            return;
        };

        game.state.apply_move(side, direction);

        match game.state.evaluate_termination() {
            TickOutcome::Finished => {
                let match_id = game.id;
                self.end_match(match_id, EndReason::Boundary);
            }
            TickOutcome::Running => {
                let snapshot = game.state.snapshot(game.id);
                send_to_match(&self.registry, game, ServerMessage::GameState(snapshot));
            }
        }
    }

    /// Runs one simulation step for a match and streams the result.
    pub fn tick(&mut self, match_id: MatchId) -> TickOutcome {
        let Some(game) = self.matches.find_by_match_id_mut(match_id) else {
            return TickOutcome::Finished;
        };

        match game.state.advance() {
            TickOutcome::Finished => {
                self.end_match(match_id, EndReason::Boundary);
                TickOutcome::Finished
            }
            TickOutcome::Running => {
                let snapshot = game.state.snapshot(match_id);
                send_to_match(&self.registry, game, ServerMessage::GameState(snapshot));
                TickOutcome::Running
            }
        }
    }

    /// Tears a match down. Safe to call more than once; only the first call
    /// does anything.
    ///
    /// Occupants that are still registered get their in-match flag cleared and
    /// a `gameOver` message.
    pub fn end_match(&mut self, match_id: MatchId, reason: EndReason) -> bool {
        let Some(mut game) = self.matches.remove(match_id) else {
            return false;
        };

        game.state.ended = true;
        game.cancel.cancel();

        for occupant in game.occupants() {
            self.registry.mark_in_match(occupant, false);
        }

        let delivered = send_to_match(
            &self.registry,
            &game,
            ServerMessage::GameOver(reason.message()),
        );
        info!(
            "Match {} ended after {} ticks ({:?}), notified {} occupant(s)",
            match_id, game.state.tick, reason, delivered
        );
        true
    }

    fn display_name(&self, id: IdentityId) -> String {
        self.registry
            .get(id)
            .map(|identity| identity.name.clone())
            .unwrap_or_default()
    }
}

/// Entry point used by connection tasks. Cheap to clone.
#[derive(Clone)]
pub struct Coordinator {
    lobby: Arc<Mutex<Lobby>>,
    names: Arc<dyn NameGenerator>,
    tick_interval: Duration,
}

impl Coordinator {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_names(config.names.generator(), config.tick_interval)
    }

    pub fn with_names(names: Arc<dyn NameGenerator>, tick_interval: Duration) -> Self {
        Self {
            lobby: Arc::new(Mutex::new(Lobby::new())),
            names,
            tick_interval,
        }
    }

    /// Shared state, for inspection.
    pub fn lobby(&self) -> &Arc<Mutex<Lobby>> {
        &self.lobby
    }

    pub async fn connect(&self, channel: Channel) -> IdentityId {
        let name = self.names.generate();
        self.lobby.lock().await.connect(channel, name)
    }

    pub async fn disconnect(&self, channel_id: ChannelId) {
        let mut lobby = self.lobby.lock().await;
        if lobby.disconnect(channel_id).is_none() {
            debug!("Disconnect for unknown channel {}", channel_id);
        }
    }

    /// Decodes one text frame and dispatches it. Bad frames are logged and
    /// dropped; the connection stays open.
    pub async fn handle_frame(&self, channel_id: ChannelId, text: &str) {
        match ClientMessage::decode(text) {
            Ok(message) => self.dispatch(channel_id, message).await,
            Err(e) => warn!("Ignoring frame from channel {}: {}", channel_id, e),
        }
    }

    pub async fn dispatch(&self, channel_id: ChannelId, message: ClientMessage) {
        let mut lobby = self.lobby.lock().await;
        let Some(sender) = lobby.registry.find_by_channel(channel_id).map(|i| i.id) else {
            debug!("Dropping {:?} from unregistered channel {}", message, channel_id);
            return;
        };

        match message {
            ClientMessage::Challenge(target) => {
                let started = lobby.challenge(sender, &target);
                drop(lobby);
                if let Some((match_id, cancel)) = started {
                    self.spawn_match(match_id, cancel);
                }
            }
            ClientMessage::Move(direction) => lobby.handle_move(sender, direction),
        }
    }

    fn spawn_match(&self, match_id: MatchId, cancel: CancellationToken) -> JoinHandle<()> {
        let lobby = Arc::clone(&self.lobby);
        let period = self.tick_interval;
        tokio::spawn(async move {
            run_match(lobby, match_id, period, cancel).await;
        })
    }
}

/// Tick loop of one match. Stops when the match finishes or its token is
/// cancelled by a disconnect.
async fn run_match(
    lobby: Arc<Mutex<Lobby>>,
    match_id: MatchId,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Skip the first tick since it fires immediately
    ticker.tick().await;

    debug!("Match {} ticking every {:?}", match_id, period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Match {} tick task cancelled", match_id);
                break;
            }
            _ = ticker.tick() => {
                let mut lobby = lobby.lock().await;
                if lobby.tick(match_id) == TickOutcome::Finished {
                    break;
                }
            }
        }
    }
}
