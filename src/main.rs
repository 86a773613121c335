//! Memory Match host (default binary).
//!
//! Runs the game loop and serves it to presentation clients over the
//! control adapter. Board size and timing come from `MATCH_*` variables,
//! the listener from `MATCH_ADAPTER_*`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use memory_match::adapter::Adapter;
use memory_match::core::{GameConfig, GameController, UpperLetters};
use memory_match::session::GameSession;
use memory_match::types::TICK_MS;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GameConfig::from_env();
    let deck = UpperLetters::new(config.seed);
    let (rows, cols) = (config.rows, config.cols);
    let game = GameController::new(config, deck).context("failed to deal the board")?;

    let Some(mut adapter) = Adapter::start_from_env()? else {
        info!("control adapter disabled via MATCH_ADAPTER_DISABLED; nothing to serve");
        return Ok(());
    };
    info!(addr = %adapter.local_addr(), rows, cols, "memory match ready");

    let mut session = GameSession::new(game);
    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();
    let mut out = Vec::new();

    loop {
        std::thread::sleep(tick_duration.saturating_sub(last_tick.elapsed()));

        while let Some(inbound) = adapter.try_recv() {
            session.handle(inbound, &mut out);
        }

        let elapsed = last_tick.elapsed();
        last_tick = Instant::now();
        session.tick(elapsed.as_millis().min(u32::MAX as u128) as u32);

        out.extend(session.poll_broadcast());
        for msg in out.drain(..) {
            adapter.send(msg);
        }
    }
}
