//! `fairdraw check` command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use fairdraw_core::clock::{Clock, SystemClock};
use fairdraw_core::round::RoundState;
use fairdraw_core::upkeep;

use super::RoundSnapshot;

pub fn run(snapshot: PathBuf, now_ms: Option<i64>, format: String) -> Result<()> {
    let contents = fs::read_to_string(&snapshot)
        .with_context(|| format!("Failed to read snapshot {}", snapshot.display()))?;
    let state: RoundSnapshot =
        serde_json::from_str(&contents).context("Snapshot is not valid JSON")?;

    let now = now_ms.unwrap_or_else(|| SystemClock.now_ms());
    let check = upkeep::check_upkeep(&state.round, &state.config, now);

    if format == "json" {
        println!(
            "{}",
            serde_json::json!({
                "state": state.round.state(),
                "participants": state.round.participant_count(),
                "pool": state.round.pool(),
                "last_draw_at_ms": state.round.last_draw_at_ms(),
                "recent_winner": state.round.recent_winner().map(|w| w.to_hex()),
                "now_ms": now,
                "check": check,
                "needed": check.needed(),
            })
        );
        return Ok(());
    }

    println!("🔍 Round snapshot: {}", snapshot.display());
    match state.round.state() {
        RoundState::Open => println!("   State:         open"),
        RoundState::Calculating { request_id } => {
            println!("   State:         calculating (request {})", request_id)
        }
    }
    println!("   Participants:  {}", state.round.participant_count());
    println!("   Pool:          {}", state.round.pool());
    println!("   Last draw at:  {} ms", state.round.last_draw_at_ms());
    if let Some(winner) = state.round.recent_winner() {
        println!("   Recent winner: {}", winner);
    }
    println!("   Saved at:      {} ms", state.saved_at_ms);
    println!();
    println!("⏱️  Upkeep at {} ms:", now);
    println!("   round open:        {}", check.round_open);
    println!("   interval elapsed:  {}", check.interval_elapsed);
    println!("   has participants:  {}", check.has_participants);
    println!("   has pool:          {}", check.has_pool);
    println!();
    if check.needed() {
        println!("✅ A draw is due");
    } else {
        println!("⏳ No draw is due");
    }

    Ok(())
}
