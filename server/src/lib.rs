//! # Pong Session Server Library
//!
//! This library provides the authoritative server for two-player Pong over
//! WebSockets. Clients connect, receive a display name, challenge each other
//! by name, and then steer paddles while the server simulates the ball and
//! streams the match state to both players.
//!
//! ## Core Responsibilities
//!
//! ### Identity Lifecycle
//! Every connection is registered as an identity with a generated display
//! name. The server greets it with `welcome` and sends the refreshed player
//! list to everyone. Disconnecting removes the identity and ends any match it
//! was playing.
//!
//! ### Matchmaking
//! A `challenge` names another player. The challenge succeeds only if that
//! player exists, is someone else, and neither side is already playing. The
//! challenger takes the left paddle and the target the right one.
//!
//! ### Authoritative Simulation
//! Each match runs its own tick task (16 ms by default). A tick moves the ball
//! by its velocity, reflects it inside the vertical bounce band, and ends the
//! match as soon as the ball leaves the field horizontally. Paddle moves are
//! applied as they arrive, between ticks.
//!
//! ## Architecture Design
//!
//! ### One Exclusion Domain
//! The identity registry and the match table live together in a
//! [`session::Lobby`] behind a single async mutex. Every compound operation
//! (find the sender, find its match, mutate, broadcast) runs under one lock
//! acquisition, so moves and ticks on the same match never lose updates.
//!
//! ### Task Layout
//! - **Connection reader**: one task per client, reads frames sequentially
//! - **Connection writer**: drains the client's outbound queue into the socket
//! - **Match ticker**: one task per active match, stopped by a cancellation
//!   token when the match ends for any reason
//!
//! ## Module Organization
//!
//! - `registry`: identities, channel reverse index, name lookup
//! - `matches`: active matches and the atomic create step
//! - `physics` / `game`: ball kinematics, paddle clamping, termination rule
//! - `broadcast`: per-match and registry-wide fan-out
//! - `session`: the lobby state machine and the async coordinator
//! - `network`: WebSocket accept loop and per-connection tasks
//! - `config` / `names` / `error`: ambient configuration and failures
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pong_server::config::ServerConfig;
//! use pong_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("127.0.0.1", 8080);
//!     let server = Server::bind(&config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod game;
pub mod matches;
pub mod names;
pub mod network;
pub mod physics;
pub mod registry;
pub mod session;
