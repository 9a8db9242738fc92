//! Performance benchmarks for the hot paths of the session server

use pong_server::game::{MatchState, Side, TickOutcome};
use pong_server::matches::MatchTable;
use pong_server::registry::{Channel, Registry};
use pong_server::session::Lobby;
use pong_shared::{Direction, ServerMessage};
use std::time::Instant;
use tokio::sync::mpsc;

/// Benchmarks the per-tick simulation step
#[test]
fn benchmark_match_ticks() {
    let iterations = 100_000;
    let start = Instant::now();

    let mut state = MatchState::new();
    for _ in 0..iterations {
        if state.advance() == TickOutcome::Finished {
            state = MatchState::new();
        }
    }

    let duration = start.elapsed();
    println!(
        "Match ticks: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks paddle moves including clamping
#[test]
fn benchmark_paddle_moves() {
    let iterations = 100_000;
    let start = Instant::now();

    let mut state = MatchState::new();
    for i in 0..iterations {
        let direction = if i % 3 == 0 { Direction::Down } else { Direction::Up };
        state.apply_move(Side::Left, direction);
    }

    let duration = start.elapsed();
    println!(
        "Paddle moves: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!((0.0..=380.0).contains(&state.paddle_left_y));
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks occupant lookup with many concurrent matches
#[test]
fn benchmark_occupant_lookup() {
    let mut registry = Registry::new();
    let mut table = MatchTable::new();
    let mut receivers = Vec::new();
    let mut ids = Vec::new();

    for i in 0..200u64 {
        let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
        receivers.push(rx);
        ids.push(registry.register(Channel::new(i, tx), format!("P{}", i)).id);
    }
    for pair in ids.chunks(2) {
        table.create(pair[0], pair[1], &mut registry).unwrap();
    }

    let iterations = 10_000;
    let start = Instant::now();
    for i in 0..iterations {
        let id = ids[i % ids.len()];
        assert!(table.find_by_occupant(id).is_some());
    }

    let duration = start.elapsed();
    println!(
        "Occupant lookup over {} matches: {} iterations in {:?}",
        table.len(),
        iterations,
        duration
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks a full tick including the broadcast to both occupants
#[test]
fn benchmark_lobby_tick_with_broadcast() {
    let mut lobby = Lobby::new();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let a = lobby.connect(Channel::new(1, tx_a), "A".into());
    lobby.connect(Channel::new(2, tx_b), "B".into());
    let (match_id, _cancel) = lobby.challenge(a, "B").unwrap();

    let start = Instant::now();
    let mut ticks = 0;
    while lobby.tick(match_id) == TickOutcome::Running {
        ticks += 1;
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}
    }

    let duration = start.elapsed();
    println!("Full match of {} ticks in {:?}", ticks, duration);

    assert_eq!(ticks, 500);
    assert!(duration.as_millis() < 1000);
}
