//! Runtime configuration for the session server.

use crate::names::{NameGenerator, RandomNames, SequentialNames};
use clap::ValueEnum;
use pong_shared::TICK_MILLIS;
use std::sync::Arc;
use std::time::Duration;

/// How display names are assigned to new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NameStyle {
    /// "Adjective Noun NN"
    #[default]
    Random,
    /// "Player1", "Player2", ...
    Sequential,
}

impl NameStyle {
    pub fn generator(self) -> Arc<dyn NameGenerator> {
        match self {
            NameStyle::Random => Arc::new(RandomNames),
            NameStyle::Sequential => Arc::new(SequentialNames::new()),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Period of each match's simulation tick.
    pub tick_interval: Duration,
    pub names: NameStyle,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            ..Self::default()
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_names(mut self, names: NameStyle) -> Self {
        self.names = names;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            tick_interval: Duration::from_millis(TICK_MILLIS),
            names: NameStyle::Random,
        }
    }
}
