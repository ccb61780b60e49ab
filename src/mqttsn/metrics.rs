//! Adapter metrics.
//!
//! Thread-safe counters for the adaptation layer's observable events. The
//! gateway's exporter surface is out of scope; consumers read point-in-time
//! snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Atomic counter for thread-safe metric updates.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Atomic gauge for current values.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Adapter metrics
// ---------------------------------------------------------------------------

/// Counters for the MQTT-SN adaptation surface, shared by every bound
/// connection of one gateway.
#[derive(Debug, Default)]
pub struct AdapterMetrics {
    pub topics_resolved: Counter,
    pub aliases_registered: Counter,
    pub protocol_errors: Counter,
    pub alias_exhaustions: Counter,
    pub sleep_entries: Counter,
    pub awake_entries: Counter,
    pub flush_signals: Counter,
    pub connections: Gauge,
}

impl AdapterMetrics {
    pub fn snapshot(&self) -> AdapterMetricsSnapshot {
        AdapterMetricsSnapshot {
            topics_resolved: self.topics_resolved.get(),
            aliases_registered: self.aliases_registered.get(),
            protocol_errors: self.protocol_errors.get(),
            alias_exhaustions: self.alias_exhaustions.get(),
            sleep_entries: self.sleep_entries.get(),
            awake_entries: self.awake_entries.get(),
            flush_signals: self.flush_signals.get(),
            connections: self.connections.get(),
        }
    }
}

/// Point-in-time view of the adapter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterMetricsSnapshot {
    pub topics_resolved: u64,
    pub aliases_registered: u64,
    pub protocol_errors: u64,
    pub alias_exhaustions: u64,
    pub sleep_entries: u64,
    pub awake_entries: u64,
    pub flush_signals: u64,
    pub connections: u64,
}
