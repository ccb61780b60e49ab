//! Sleep-cycle connection overlay.
//!
//! MQTT-SN devices cycle through active/asleep/awake phases on top of the
//! generic authenticated/disconnected session lifecycle. The overlay is a
//! per-connection record composed with the generic connection object; it
//! never inherits from it. All mutation happens on the owning connection's
//! processing context, so the record itself needs no lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Base-connection collaborator
// ---------------------------------------------------------------------------

/// The generic connection's base lifecycle as consumed by the overlay.
///
/// Implemented by the surrounding handler chain. `enter_authenticated`
/// reports whether the base state machine accepted the transition;
/// `begin_disconnect` requests a logical disconnect in which the transport
/// may close while the session record survives.
pub trait SessionControl {
    fn enter_authenticated(&mut self) -> bool;
    fn begin_disconnect(&mut self);
}

// ---------------------------------------------------------------------------
// Overlay state machine
// ---------------------------------------------------------------------------

/// Sleep-cycle phase of an MQTT-SN connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnConnectionState {
    /// Initial, and terminal only at final teardown.
    #[default]
    Disconnected,
    /// Connected and exchanging frames normally.
    Active,
    /// Logically disconnected; deliveries queue at the gateway.
    Asleep,
    /// Briefly reachable to drain queued deliveries.
    Awake,
}

impl SnConnectionState {
    /// Frames can currently be delivered to the device.
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Active | Self::Awake)
    }

    pub fn is_asleep(self) -> bool {
        matches!(self, Self::Asleep)
    }
}

/// Per-connection MQTT-SN state layered over the generic connection.
#[derive(Debug)]
pub struct ConnectionOverlay {
    state: SnConnectionState,
    protocol_version: u8,
    /// msg_id -> alias id a publish went out under; pruned only by the
    /// caller's ack/timeout handling.
    publish_alias_correlation: HashMap<u16, u16>,
    sleep_duration: Option<Duration>,
    slept_at: Option<Instant>,
}

impl ConnectionOverlay {
    pub fn new(protocol_version: u8) -> Self {
        Self {
            state: SnConnectionState::Disconnected,
            protocol_version,
            publish_alias_correlation: HashMap::new(),
            sleep_duration: None,
            slept_at: None,
        }
    }

    pub fn state(&self) -> SnConnectionState {
        self.state
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Move to active, gated on the base connection accepting its
    /// authenticated state. The overlay only follows when the base agrees.
    pub fn propose_active(&mut self, base: &mut dyn SessionControl) -> bool {
        if !base.enter_authenticated() {
            return false;
        }
        self.state = SnConnectionState::Active;
        self.sleep_duration = None;
        self.slept_at = None;
        true
    }

    /// Enter the sleeping phase unconditionally and request a logical
    /// disconnect from the base. The device-announced sleep duration is
    /// recorded as data; any expiry timer belongs to the caller.
    pub fn propose_sleep(&mut self, base: &mut dyn SessionControl, duration: Option<Duration>) {
        self.state = SnConnectionState::Asleep;
        self.sleep_duration = duration;
        self.slept_at = Some(Instant::now());
        base.begin_disconnect();
    }

    /// Enter the awake phase unconditionally and ask the base to re-enter
    /// its authenticated state so queued deliveries can drain.
    pub fn propose_awake(&mut self, base: &mut dyn SessionControl) {
        self.state = SnConnectionState::Awake;
        let _ = base.enter_authenticated();
    }

    /// Final teardown: back to the initial state, correlation and sleep
    /// bookkeeping dropped.
    pub fn reset(&mut self) {
        self.state = SnConnectionState::Disconnected;
        self.publish_alias_correlation.clear();
        self.sleep_duration = None;
        self.slept_at = None;
    }

    /// Remember which alias a message id was published under.
    pub fn record_publish_alias(&mut self, msg_id: u16, alias_id: u16) {
        self.publish_alias_correlation.insert(msg_id, alias_id);
    }

    pub fn published_alias(&self, msg_id: u16) -> Option<u16> {
        self.publish_alias_correlation.get(&msg_id).copied()
    }

    /// Caller-owned cleanup on ack or timeout.
    pub fn clear_publish_alias(&mut self, msg_id: u16) -> Option<u16> {
        self.publish_alias_correlation.remove(&msg_id)
    }

    /// Duration the device announced when entering sleep, if any.
    pub fn sleep_duration(&self) -> Option<Duration> {
        self.sleep_duration
    }

    /// Time elapsed since the device entered sleep.
    pub fn asleep_for(&self) -> Option<Duration> {
        self.slept_at.map(|at| at.elapsed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
