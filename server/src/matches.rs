//! Table of active matches.
//!
//! A match only stores identity ids for its occupants; the records themselves
//! live in the [`Registry`]. Creating a match flips both occupants' in-match
//! flag in the same call so the two structures never disagree.

use crate::game::{MatchState, Side};
use crate::registry::{IdentityId, Registry};
use log::info;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub type MatchId = u32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("identity {0} is not registered")]
    UnknownIdentity(IdentityId),

    #[error("identity {0} is already in a match")]
    AlreadyInMatch(IdentityId),

    #[error("identity {0} cannot play against itself")]
    SelfMatch(IdentityId),
}

/// One active game between two identities.
#[derive(Debug)]
pub struct Match {
    pub id: MatchId,
    pub left: IdentityId,
    pub right: IdentityId,
    pub state: MatchState,
    /// Cancelled when the match ends so its tick task stops.
    pub cancel: CancellationToken,
}

impl Match {
    pub fn occupants(&self) -> [IdentityId; 2] {
        [self.left, self.right]
    }

    pub fn side_of(&self, identity: IdentityId) -> Option<Side> {
        if identity == self.left {
            Some(Side::Left)
        } else if identity == self.right {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn involves(&self, identity: IdentityId) -> bool {
        self.side_of(identity).is_some()
    }
}

#[derive(Debug)]
pub struct MatchTable {
    matches: HashMap<MatchId, Match>,
    next_match_id: MatchId,
}

impl MatchTable {
    pub fn new() -> Self {
        Self {
            matches: HashMap::new(),
            next_match_id: 1,
        }
    }

    /// Binds two idle identities into a new match.
    ///
    /// Fails without touching either structure if an identity is unknown, if
    /// both ids are the same, or if either is already in a match.
    pub fn create(
        &mut self,
        left: IdentityId,
        right: IdentityId,
        registry: &mut Registry,
    ) -> Result<MatchId, MatchError> {
        for id in [left, right] {
            let identity = registry.get(id).ok_or(MatchError::UnknownIdentity(id))?;
            if identity.in_match {
                return Err(MatchError::AlreadyInMatch(id));
            }
        }
        if left == right {
            return Err(MatchError::SelfMatch(left));
        }

        let id = self.next_match_id;
        self.next_match_id += 1;

        registry.mark_in_match(left, true);
        registry.mark_in_match(right, true);

        self.matches.insert(
            id,
            Match {
                id,
                left,
                right,
                state: MatchState::new(),
                cancel: CancellationToken::new(),
            },
        );
        info!("Match {} created: {} (left) vs {} (right)", id, left, right);

        Ok(id)
    }

    pub fn find_by_match_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(&id)
    }

    pub fn find_by_match_id_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.get_mut(&id)
    }

    pub fn find_by_occupant(&self, identity: IdentityId) -> Option<&Match> {
        self.matches.values().find(|m| m.involves(identity))
    }

    pub fn find_by_occupant_mut(&mut self, identity: IdentityId) -> Option<&mut Match> {
        self.matches.values_mut().find(|m| m.involves(identity))
    }

    pub fn remove(&mut self, id: MatchId) -> Option<Match> {
        self.matches.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl Default for MatchTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Channel;
    use tokio::sync::mpsc;

    fn registry_with(names: &[&str]) -> (Registry, Vec<IdentityId>) {
        let mut registry = Registry::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (tx, _rx) = mpsc::unbounded_channel();
                registry.register(Channel::new(i as u64, tx), name.to_string()).id
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_create_marks_exactly_two_identities() {
        let (mut registry, ids) = registry_with(&["A", "B", "C"]);
        let mut table = MatchTable::new();

        let match_id = table.create(ids[0], ids[1], &mut registry).unwrap();

        assert_eq!(table.len(), 1);
        assert!(registry.get(ids[0]).unwrap().in_match);
        assert!(registry.get(ids[1]).unwrap().in_match);
        assert!(!registry.get(ids[2]).unwrap().in_match);

        let m = table.find_by_match_id(match_id).unwrap();
        assert_eq!(m.left, ids[0]);
        assert_eq!(m.right, ids[1]);
        assert_eq!(m.state.paddle_left_y, 40.0);
        assert!(!m.cancel.is_cancelled());
    }

    #[test]
    fn test_create_rejects_busy_identity() {
        let (mut registry, ids) = registry_with(&["A", "B", "C"]);
        let mut table = MatchTable::new();
        table.create(ids[0], ids[1], &mut registry).unwrap();

        let err = table.create(ids[2], ids[1], &mut registry).unwrap_err();
        assert_eq!(err, MatchError::AlreadyInMatch(ids[1]));
        assert_eq!(table.len(), 1);
        assert!(!registry.get(ids[2]).unwrap().in_match);
    }

    #[test]
    fn test_create_rejects_unknown_identity() {
        let (mut registry, ids) = registry_with(&["A"]);
        let mut table = MatchTable::new();

        let err = table.create(ids[0], 42, &mut registry).unwrap_err();
        assert_eq!(err, MatchError::UnknownIdentity(42));
        assert!(table.is_empty());
        assert!(!registry.get(ids[0]).unwrap().in_match);
    }

    #[test]
    fn test_create_rejects_same_identity_twice() {
        let (mut registry, ids) = registry_with(&["A"]);
        let mut table = MatchTable::new();

        let err = table.create(ids[0], ids[0], &mut registry).unwrap_err();
        assert_eq!(err, MatchError::SelfMatch(ids[0]));
        assert!(table.is_empty());
        assert!(!registry.get(ids[0]).unwrap().in_match);
    }

    #[test]
    fn test_find_by_occupant() {
        let (mut registry, ids) = registry_with(&["A", "B", "C"]);
        let mut table = MatchTable::new();
        let match_id = table.create(ids[0], ids[1], &mut registry).unwrap();

        assert_eq!(table.find_by_occupant(ids[0]).map(|m| m.id), Some(match_id));
        assert_eq!(table.find_by_occupant(ids[1]).map(|m| m.id), Some(match_id));
        assert!(table.find_by_occupant(ids[2]).is_none());
    }

    #[test]
    fn test_mutation_through_lookup_persists() {
        let (mut registry, ids) = registry_with(&["A", "B"]);
        let mut table = MatchTable::new();
        let match_id = table.create(ids[0], ids[1], &mut registry).unwrap();

        table.find_by_occupant_mut(ids[1]).unwrap().state.paddle_right_y = 100.0;
        assert_eq!(
            table.find_by_match_id(match_id).unwrap().state.paddle_right_y,
            100.0
        );
    }

    #[test]
    fn test_side_of() {
        let (mut registry, ids) = registry_with(&["A", "B"]);
        let mut table = MatchTable::new();
        let match_id = table.create(ids[0], ids[1], &mut registry).unwrap();
        let m = table.find_by_match_id(match_id).unwrap();

        assert_eq!(m.side_of(ids[0]), Some(Side::Left));
        assert_eq!(m.side_of(ids[1]), Some(Side::Right));
        assert_eq!(m.side_of(999), None);
        assert_eq!(m.occupants(), [ids[0], ids[1]]);
    }

    #[test]
    fn test_remove() {
        let (mut registry, ids) = registry_with(&["A", "B"]);
        let mut table = MatchTable::new();
        let match_id = table.create(ids[0], ids[1], &mut registry).unwrap();

        assert!(table.remove(match_id).is_some());
        assert!(table.find_by_match_id(match_id).is_none());
        assert!(table.remove(match_id).is_none());
    }
}
