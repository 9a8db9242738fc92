//! Display-name generation for new identities.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};

const ADJECTIVES: [&str; 12] = [
    "Swift", "Brave", "Quiet", "Lucky", "Clever", "Rapid", "Bold", "Calm", "Eager", "Sly",
    "Nimble", "Steady",
];

const NOUNS: [&str; 12] = [
    "Falcon", "Otter", "Comet", "Badger", "Heron", "Panda", "Viper", "Lynx", "Raven", "Tiger",
    "Gecko", "Walrus",
];

/// Produces labels for newly connected clients. Labels need not be unique.
pub trait NameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// "Adjective Noun NN", e.g. "Swift Otter 42".
#[derive(Debug, Default)]
pub struct RandomNames;

impl NameGenerator for RandomNames {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Anonymous");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Player");
        format!("{} {} {}", adjective, noun, rng.gen_range(10..100))
    }
}

/// "Player1", "Player2", ... in connection order.
#[derive(Debug)]
pub struct SequentialNames {
    next: AtomicU32,
}

impl SequentialNames {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }
}

impl Default for SequentialNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator for SequentialNames {
    fn generate(&self) -> String {
        format!("Player{}", self.next.fetch_add(1, Ordering::Relaxed))
    }
}
