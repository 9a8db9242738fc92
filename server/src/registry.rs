//! Registry of connected identities
//!
//! This module holds the server-side record of every connected client:
//! - Identity allocation when a connection is established
//! - Reverse lookup from a connection's channel to its identity
//! - Display-name lookup used by matchmaking
//! - The in-match flag that gates who can be challenged
//!
//! The registry is a plain data structure. It is only ever touched while the
//! caller holds the lobby lock, so none of its methods synchronise.

use log::{debug, info};
use pong_shared::ServerMessage;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;

pub type IdentityId = u32;
pub type ChannelId = u64;

/// Outbound half of a client connection.
///
/// Messages pushed here are drained by the connection's writer task. Sending
/// never blocks; it only fails once the writer has gone away.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Channel {
    pub fn new(id: ChannelId, sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    pub fn send(&self, message: ServerMessage) -> Result<(), ServerMessage> {
        self.sender.send(message).map_err(|e| e.0)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A connected client as the server sees it
#[derive(Debug)]
pub struct Identity {
    /// Unique identifier assigned when the connection was registered
    pub id: IdentityId,
    /// Human-readable label, not guaranteed unique
    pub name: String,
    /// Where outbound messages for this client go
    pub channel: Channel,
    /// True while a match binds this identity
    pub in_match: bool,
}

impl Identity {
    pub fn new(id: IdentityId, name: String, channel: Channel) -> Self {
        Self {
            id,
            name,
            channel,
            in_match: false,
        }
    }
}

/// All connected identities.
///
/// Identities are kept ordered by id, which is also connection order, so
/// presence lists and name lookups are deterministic.
#[derive(Debug)]
pub struct Registry {
    identities: BTreeMap<IdentityId, Identity>,
    by_channel: HashMap<ChannelId, IdentityId>,
    next_identity_id: IdentityId,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            identities: BTreeMap::new(),
            by_channel: HashMap::new(),
            next_identity_id: 1,
        }
    }

    /// Registers a new identity for the given channel and returns it.
    pub fn register(&mut self, channel: Channel, name: String) -> &Identity {
        let id = self.next_identity_id;
        self.next_identity_id += 1;

        info!("Identity {} registered as '{}' on channel {}", id, name, channel.id);
        self.by_channel.insert(channel.id, id);
        self.identities
            .entry(id)
            .or_insert_with(|| Identity::new(id, name, channel))
    }

    /// Removes an identity. Returns the removed record, or None if it was
    /// already gone.
    pub fn unregister(&mut self, id: IdentityId) -> Option<Identity> {
        let identity = self.identities.remove(&id)?;
        self.by_channel.remove(&identity.channel.id);
        info!("Identity {} ('{}') unregistered", id, identity.name);
        Some(identity)
    }

    pub fn get(&self, id: IdentityId) -> Option<&Identity> {
        self.identities.get(&id)
    }

    pub fn find_by_channel(&self, channel_id: ChannelId) -> Option<&Identity> {
        let identity = self
            .by_channel
            .get(&channel_id)
            .and_then(|id| self.identities.get(id));
        if identity.is_none() {
            debug!("No identity for channel {}", channel_id);
        }
        identity
    }

    /// First identity with the given display name, in connection order.
    pub fn find_by_name(&self, name: &str) -> Option<&Identity> {
        self.identities.values().find(|identity| identity.name == name)
    }

    /// Sets the in-match flag. Returns false if the identity is unknown.
    pub fn mark_in_match(&mut self, id: IdentityId, value: bool) -> bool {
        match self.identities.get_mut(&id) {
            Some(identity) => {
                identity.in_match = value;
                true
            }
            None => false,
        }
    }

    /// Display names of everyone connected, in connection order.
    pub fn names(&self) -> Vec<String> {
        self.identities.values().map(|i| i.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn test_channel(id: ChannelId) -> (Channel, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Channel::new(id, tx), rx)
    }

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_register_assigns_fresh_ids() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(10);
        let (c2, _r2) = test_channel(11);

        let id1 = registry.register(c1, "Player1".into()).id;
        let id2 = registry.register(c2, "Player2".into()).id;

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(registry.len(), 2);
        assert!(!registry.get(id1).unwrap().in_match);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(1);
        let (c2, _r2) = test_channel(2);

        let id1 = registry.register(c1, "A".into()).id;
        registry.unregister(id1);
        let id2 = registry.register(c2, "B".into()).id;

        assert_ne!(id1, id2);
    }

    #[test]
    fn test_unregister() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(5);
        let id = registry.register(c1, "Player1".into()).id;

        let removed = registry.unregister(id).unwrap();
        assert_eq!(removed.name, "Player1");
        assert!(registry.is_empty());
        assert!(registry.find_by_channel(5).is_none());
        assert!(registry.unregister(id).is_none());
    }

    #[test]
    fn test_find_by_channel() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(100);
        let (c2, _r2) = test_channel(200);
        registry.register(c1, "A".into());
        let id2 = registry.register(c2, "B".into()).id;

        assert_eq!(registry.find_by_channel(200).map(|i| i.id), Some(id2));
        assert!(registry.find_by_channel(300).is_none());
    }

    #[test]
    fn test_find_by_name_first_wins() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(1);
        let (c2, _r2) = test_channel(2);
        let first = registry.register(c1, "Twin".into()).id;
        registry.register(c2, "Twin".into());

        assert_eq!(registry.find_by_name("Twin").map(|i| i.id), Some(first));
        assert!(registry.find_by_name("Nobody").is_none());
    }

    #[test]
    fn test_mark_in_match() {
        let mut registry = Registry::new();
        let (c1, _r1) = test_channel(1);
        let id = registry.register(c1, "A".into()).id;

        assert!(registry.mark_in_match(id, true));
        assert!(registry.get(id).unwrap().in_match);
        assert!(registry.mark_in_match(id, false));
        assert!(!registry.get(id).unwrap().in_match);
        assert!(!registry.mark_in_match(999, true));
    }

    #[test]
    fn test_names_in_connection_order() {
        let mut registry = Registry::new();
        for (i, name) in ["Cyan", "Amber", "Bronze"].iter().enumerate() {
            let (channel, _rx) = test_channel(i as ChannelId);
            registry.register(channel, name.to_string());
        }
        assert_eq!(registry.names(), vec!["Cyan", "Amber", "Bronze"]);
    }

    #[test]
    fn test_channel_send_after_receiver_dropped() {
        let (channel, rx) = test_channel(1);
        assert_ok!(channel.send(ServerMessage::Welcome("A".into())));
        drop(rx);
        assert!(channel.is_closed());
        assert_err!(channel.send(ServerMessage::Welcome("A".into())));
    }
}
