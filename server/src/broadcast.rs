//! Outbound fan-out to match occupants and to everyone connected.
//!
//! Delivery failures are logged per recipient and never stop delivery to the
//! others. A failed send means the connection's writer task is gone; the
//! reader side will notice the disconnect and clean up.

use crate::matches::Match;
use crate::registry::{IdentityId, Registry};
use log::{debug, warn};
use pong_shared::ServerMessage;

/// Sends a message to one identity. Returns true if it was queued.
pub fn send_to(registry: &Registry, identity: IdentityId, message: ServerMessage) -> bool {
    let Some(target) = registry.get(identity) else {
        debug!("Dropping {} for unknown identity {}", message.kind(), identity);
        return false;
    };

    let kind = message.kind();
    if target.channel.send(message).is_err() {
        warn!(
            "Failed to deliver {} to identity {} ('{}')",
            kind, target.id, target.name
        );
        return false;
    }
    true
}

/// Sends the same message to both occupants of a match.
/// Returns how many occupants it was queued for.
pub fn send_to_match(registry: &Registry, game: &Match, message: ServerMessage) -> usize {
    game.occupants()
        .into_iter()
        .filter(|&occupant| send_to(registry, occupant, message.clone()))
        .count()
}

/// Sends the current list of display names to every connected identity.
pub fn broadcast_presence(registry: &Registry) -> usize {
    let names = registry.names();
    registry
        .iter()
        .filter(|identity| send_to(registry, identity.id, ServerMessage::Players(names.clone())))
        .count()
}
