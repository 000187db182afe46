//! In-process counters for draw observability.
//!
//! Keepers and operators poll these to decide whether to retry, alert, or
//! ignore; nothing here is exported over the network.

use std::sync::atomic::{AtomicU64, Ordering};

/// A simple counter that can only increase.
#[derive(Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A gauge holding the latest observed value.
#[derive(Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn set(&self, v: u64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Central metrics for one draw instance.
pub struct DrawMetrics {
    // Counters
    pub entries_total: Counter,
    pub entries_rejected: Counter,
    pub draws_started: Counter,
    pub draws_completed: Counter,
    pub stale_responses: Counter,
    pub unauthorized_callbacks: Counter,
    pub payout_failures: Counter,

    // Gauges
    pub pool_balance: Gauge,
    pub participant_slots: Gauge,
}

impl DrawMetrics {
    pub fn new() -> Self {
        Self {
            entries_total: Counter::new(),
            entries_rejected: Counter::new(),
            draws_started: Counter::new(),
            draws_completed: Counter::new(),
            stale_responses: Counter::new(),
            unauthorized_callbacks: Counter::new(),
            payout_failures: Counter::new(),

            pool_balance: Gauge::new(),
            participant_slots: Gauge::new(),
        }
    }

    /// Export metrics as JSON for operator tooling.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "counters": {
                "entries_total": self.entries_total.get(),
                "entries_rejected": self.entries_rejected.get(),
                "draws_started": self.draws_started.get(),
                "draws_completed": self.draws_completed.get(),
                "stale_responses": self.stale_responses.get(),
                "unauthorized_callbacks": self.unauthorized_callbacks.get(),
                "payout_failures": self.payout_failures.get(),
            },
            "gauges": {
                "pool_balance": self.pool_balance.get(),
                "participant_slots": self.participant_slots.get(),
            },
        })
    }
}

impl Default for DrawMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);

        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn gauge_tracks_the_latest_value() {
        let gauge = Gauge::new();
        gauge.set(300);
        assert_eq!(gauge.get(), 300);
        gauge.set(0);
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn metrics_export_to_json() {
        let metrics = DrawMetrics::new();
        metrics.entries_total.inc();
        metrics.draws_completed.inc();
        metrics.pool_balance.set(42);

        let json = metrics.to_json();
        assert_eq!(json["counters"]["entries_total"], 1);
        assert_eq!(json["counters"]["draws_completed"], 1);
        assert_eq!(json["gauges"]["pool_balance"], 42);
    }
}
