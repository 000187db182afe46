//! `fairdraw verify-log` command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

use fairdraw_core::events;

pub fn run(log: PathBuf) -> Result<()> {
    println!("🔗 Verifying event log {}", log.display());

    let records = events::verify_chain(&log)
        .with_context(|| format!("Hash chain verification failed for {}", log.display()))?;

    println!("✅ Chain intact: {} record(s)", records);
    Ok(())
}
