//! `fairdraw simulate` command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use fairdraw_core::adapters::{InMemoryBank, InMemoryOracle};
use fairdraw_core::clock::{Clock, ManualClock};
use fairdraw_core::config::RoundConfig;
use fairdraw_core::engine::DrawEngine;
use fairdraw_core::events::{EventRecorder, FileEventLog};
use fairdraw_core::{ParticipantId, RandomnessSource};

use super::RoundSnapshot;

fn short(id: &ParticipantId) -> String {
    id.to_hex()[..12].to_string()
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    rounds: u32,
    participants: u32,
    entrance_fee: u64,
    interval_ms: i64,
    seed: u64,
    log: Option<PathBuf>,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    if participants == 0 {
        anyhow::bail!("At least one participant per round is required");
    }

    let config = RoundConfig::builder()
        .entrance_fee(entrance_fee)
        .interval_ms(interval_ms)
        .build()
        .context("Invalid round configuration")?;

    let clock = ManualClock::new(0);
    let bank = InMemoryBank::new();
    let engine_config = config.clone();
    let mut engine = DrawEngine::new(
        engine_config,
        InMemoryOracle::new(seed),
        bank.clone(),
        clock.now_ms(),
    )
    .context("Failed to construct draw engine")?;

    let oracle_id = engine.oracle().id();
    let recorder = log
        .map(FileEventLog::open)
        .transpose()
        .context("Failed to open event log")?;
    if let Some(rec) = &recorder {
        println!("🔗 Appending events to {}", rec.path().display());
    }

    println!(
        "🎲 Simulating {} round(s), {} participants each, fee {}, interval {} ms",
        rounds, participants, entrance_fee, interval_ms
    );
    println!();

    for round_no in 1..=rounds {
        for player in 0..participants {
            let id = ParticipantId::from_label(&format!("round-{round_no}-player-{player}"));
            let accepted = engine.enter(id, entrance_fee)?;
            if let Some(rec) = &recorder {
                rec.record(&accepted.into())?;
            }
        }
        println!(
            "🎟️  Round {}: {} entries, pool {}",
            round_no,
            engine.round().participant_count(),
            engine.round().pool()
        );

        clock.advance(interval_ms + 1);
        let started = engine.perform_upkeep(clock.now_ms())?;
        if let Some(rec) = &recorder {
            rec.record(&started.into())?;
        }

        let (request_id, random_value) = engine
            .oracle()
            .next_response()
            .context("Oracle produced no response for the outstanding request")?;
        let completed =
            engine.complete_draw(oracle_id, request_id, random_value, clock.now_ms())?;
        if let Some(rec) = &recorder {
            rec.record(&completed.into())?;
        }

        println!(
            "🏆 Round {}: winner {} takes {}",
            round_no,
            short(&completed.winner),
            completed.amount
        );
    }

    println!();
    println!("💰 Final balances:");
    let mut balances = bank.balances();
    balances.sort_by(|a, b| b.1.cmp(&a.1));
    for (id, amount) in &balances {
        println!("   {}: {}", short(id), amount);
    }
    println!("   Total paid out: {}", bank.total());

    println!();
    println!("📊 Metrics:");
    let metrics_json = serde_json::to_string_pretty(&engine.metrics().to_json())?;
    println!("{metrics_json}");

    if let Some(path) = snapshot {
        let state = RoundSnapshot {
            config,
            round: engine.round().clone(),
            saved_at_ms: clock.now_ms(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        println!();
        println!("💾 Saved round snapshot to {}", path.display());
    }

    println!();
    println!("✅ Simulated {} round(s)", rounds);
    Ok(())
}
