//! Integration boundary consumed by the generic handler chain.
//!
//! The chain is the only caller of this core. Inbound, it resolves frame
//! addressing through [`SnConnection::resolve_topic`] before dispatch;
//! outbound, it obtains addressing through
//! [`SnConnection::outbound_addressing`] before encoding. Sleep-cycle
//! control frames land on the lifecycle methods, and the chain's in-flight
//! accounting reports zero crossings through
//! [`SnConnection::inflight_drained`]. Failures surface as
//! [`TopicAliasError`] values; turning them into disconnects or negative
//! acks is the chain's policy, never this core's.

use crate::core::config::GatewayConfig;
use crate::core::exec::ConnectionExecutor;
use crate::mqttsn::alias::{TopicAlias, TopicAliasError, TopicIdType};
use crate::mqttsn::flush::AwakeFlushCoordinator;
use crate::mqttsn::metrics::AdapterMetrics;
use crate::mqttsn::overlay::{ConnectionOverlay, SessionControl, SnConnectionState};
use crate::mqttsn::registry::{PredefinedAliasTable, TopicAliasRegistry};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Contract types
// ---------------------------------------------------------------------------

/// Addressing for an outbound publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAddressing {
    pub alias: TopicAlias,
    /// True exactly when a fresh session alias was allocated and the chain
    /// must run the REGISTER exchange before the publish uses it.
    pub needs_register: bool,
}

/// A message queued while a device slept, handed to the chain's drain loop
/// when the device wakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPublish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
    /// Message id when the delivery is acknowledged (QoS above 0).
    pub msg_id: Option<u16>,
}

// ---------------------------------------------------------------------------
// Gateway handle
// ---------------------------------------------------------------------------

/// Process-wide handle owning the alias registry and adapter metrics.
///
/// Constructed once at gateway start and passed by handle to every call
/// site; the registry is an explicit store with a defined lifecycle, never
/// a global.
#[derive(Debug)]
pub struct SnGateway {
    registry: Arc<TopicAliasRegistry>,
    metrics: Arc<AdapterMetrics>,
}

impl SnGateway {
    pub fn new(predefined: PredefinedAliasTable) -> Self {
        Self {
            registry: Arc::new(TopicAliasRegistry::new(Arc::new(predefined))),
            metrics: Arc::new(AdapterMetrics::default()),
        }
    }

    /// Build the predefined table from configuration; rejects reserved and
    /// duplicate ids.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, TopicAliasError> {
        let table = PredefinedAliasTable::from_entries(config.predefined_entries())?;
        Ok(Self::new(table))
    }

    pub fn registry(&self) -> &TopicAliasRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &AdapterMetrics {
        &self.metrics
    }

    /// Create the per-connection binding: overlay, flush coordinator and
    /// execution context. Spawns the connection's drain task, so a tokio
    /// runtime must be current.
    pub fn bind(&self, client_id: impl Into<String>, protocol_version: u8) -> SnConnection {
        let client_id = client_id.into();
        let exec = ConnectionExecutor::spawn();
        self.metrics.connections.inc();
        tracing::debug!(client_id = %client_id, protocol_version, "bound MQTT-SN connection");
        SnConnection {
            flush: AwakeFlushCoordinator::new(exec.clone()),
            overlay: ConnectionOverlay::new(protocol_version),
            registry: self.registry.clone(),
            metrics: self.metrics.clone(),
            client_id,
            exec,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection binding
// ---------------------------------------------------------------------------

/// One MQTT-SN connection's view of the adaptation core.
pub struct SnConnection {
    client_id: String,
    registry: Arc<TopicAliasRegistry>,
    metrics: Arc<AdapterMetrics>,
    overlay: ConnectionOverlay,
    flush: AwakeFlushCoordinator,
    exec: ConnectionExecutor,
}

impl SnConnection {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> SnConnectionState {
        self.overlay.state()
    }

    pub fn overlay(&self) -> &ConnectionOverlay {
        &self.overlay
    }

    pub fn executor(&self) -> &ConnectionExecutor {
        &self.exec
    }

    /// Inbound path: decode frame addressing into a topic name.
    pub fn resolve_topic(
        &self,
        id_type: TopicIdType,
        topic_data: &[u8],
        read_normal_as_full: bool,
    ) -> Result<String, TopicAliasError> {
        match self
            .registry
            .read_topic_name(&self.client_id, id_type, topic_data, read_normal_as_full)
        {
            Ok(topic_name) => {
                self.metrics.topics_resolved.inc();
                Ok(topic_name)
            }
            Err(err) => {
                self.metrics.protocol_errors.inc();
                tracing::warn!(client_id = %self.client_id, %err, "topic resolution failed");
                Err(err)
            }
        }
    }

    /// Outbound path: the alias to address `topic_name` with, allocating a
    /// fresh session alias when no alias class covers it yet.
    pub fn outbound_addressing(
        &self,
        topic_name: &str,
    ) -> Result<OutboundAddressing, TopicAliasError> {
        if let Some(alias) = self.registry.read_topic_alias(&self.client_id, topic_name) {
            return Ok(OutboundAddressing {
                alias,
                needs_register: false,
            });
        }
        match self.registry.register(&self.client_id, topic_name) {
            Ok(alias_id) => {
                self.metrics.aliases_registered.inc();
                Ok(OutboundAddressing {
                    alias: TopicAlias::normal(topic_name, alias_id),
                    needs_register: true,
                })
            }
            Err(err) => {
                self.metrics.alias_exhaustions.inc();
                tracing::warn!(client_id = %self.client_id, %err, "alias registration failed");
                Err(err)
            }
        }
    }

    /// Remember which alias a message id was published under, for
    /// protocols that need the correlation on acknowledgment.
    pub fn record_publish_alias(&mut self, msg_id: u16, alias_id: u16) {
        self.overlay.record_publish_alias(msg_id, alias_id);
    }

    pub fn published_alias(&self, msg_id: u16) -> Option<u16> {
        self.overlay.published_alias(msg_id)
    }

    pub fn clear_publish_alias(&mut self, msg_id: u16) -> Option<u16> {
        self.overlay.clear_publish_alias(msg_id)
    }

    /// CONNECT accepted: activate, gated on the base state machine.
    pub fn connect_accepted(&mut self, base: &mut dyn SessionControl) -> bool {
        let activated = self.overlay.propose_active(base);
        if activated {
            tracing::debug!(client_id = %self.client_id, "connection active");
        }
        activated
    }

    /// Sleeping DISCONNECT received: enter the sleep phase.
    pub fn sleep_requested(&mut self, base: &mut dyn SessionControl, duration: Option<Duration>) {
        self.overlay.propose_sleep(base, duration);
        self.metrics.sleep_entries.inc();
        tracing::debug!(client_id = %self.client_id, ?duration, "device entered sleep");
    }

    /// Awake PINGREQ received: arm the flush callback, then enter the
    /// awake phase so queued deliveries drain. The callback is armed first
    /// so an immediately-empty queue cannot miss its completion signal.
    pub fn awake_requested<F>(&mut self, base: &mut dyn SessionControl, flush_callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.flush.set_flush_callback(flush_callback);
        self.overlay.propose_awake(base);
        self.metrics.awake_entries.inc();
        tracing::debug!(client_id = %self.client_id, "device awake, draining queued messages");
    }

    /// The chain's in-flight counter reached zero; may be called from any
    /// thread.
    pub fn inflight_drained(&self) {
        if self.flush.on_inflight_drained() {
            self.metrics.flush_signals.inc();
        }
    }

    pub fn has_pending_flush(&self) -> bool {
        self.flush.has_pending()
    }

    /// Final teardown: no callback may fire afterwards, the client's
    /// aliases are gone, and the connection's executor stops accepting
    /// work.
    pub fn teardown(mut self) {
        let had_pending = self.flush.cancel();
        self.overlay.reset();
        self.registry.clear_session(&self.client_id);
        self.exec.close();
        self.metrics.connections.dec();
        tracing::debug!(client_id = %self.client_id, had_pending, "connection torn down");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqttsn::alias::TopicAliasKind;

    #[derive(Default)]
    struct FakeBase {
        authenticated: bool,
        disconnect_requests: u32,
    }

    impl SessionControl for FakeBase {
        fn enter_authenticated(&mut self) -> bool {
            self.authenticated = true;
            true
        }

        fn begin_disconnect(&mut self) {
            self.authenticated = false;
            self.disconnect_requests += 1;
        }
    }

    fn gateway_with(entries: &[(u16, &str)]) -> SnGateway {
        let table = PredefinedAliasTable::from_entries(
            entries.iter().map(|(id, name)| (*id, (*name).to_string())),
        )
        .unwrap();
        SnGateway::new(table)
    }

    #[tokio::test]
    async fn test_outbound_addressing_classes() {
        let gateway = gateway_with(&[(5, "site/a")]);
        let conn = gateway.bind("sensor-1", 1);

        // Short names synthesize without touching tables.
        let short = conn.outbound_addressing("ab").unwrap();
        assert_eq!(short.alias.kind(), TopicAliasKind::Short);
        assert!(!short.needs_register);

        // Predefined names resolve from the provisioned table.
        let predefined = conn.outbound_addressing("site/a").unwrap();
        assert_eq!(predefined.alias.kind(), TopicAliasKind::Predefined);
        assert_eq!(predefined.alias.alias_id(), 5);
        assert!(!predefined.needs_register);

        // Unknown names allocate and ask for a REGISTER exchange.
        let fresh = conn.outbound_addressing("room/temp").unwrap();
        assert_eq!(fresh.alias.kind(), TopicAliasKind::Normal);
        assert_eq!(fresh.alias.alias_id(), 1);
        assert!(fresh.needs_register);

        // Second use needs no REGISTER.
        let repeat = conn.outbound_addressing("room/temp").unwrap();
        assert_eq!(repeat.alias.alias_id(), 1);
        assert!(!repeat.needs_register);

        assert_eq!(gateway.metrics().snapshot().aliases_registered, 1);
    }

    #[tokio::test]
    async fn test_resolve_topic_counts_errors() {
        let gateway = gateway_with(&[]);
        let conn = gateway.bind("sensor-1", 1);

        assert!(conn
            .resolve_topic(TopicIdType::Predefined, &[0x00, 0x09], false)
            .is_err());
        assert_eq!(gateway.metrics().snapshot().protocol_errors, 1);

        conn.outbound_addressing("room/temp").unwrap();
        let name = conn
            .resolve_topic(TopicIdType::Normal, &[0x00, 0x01], false)
            .unwrap();
        assert_eq!(name, "room/temp");
        assert_eq!(gateway.metrics().snapshot().topics_resolved, 1);
    }

    #[tokio::test]
    async fn test_teardown_clears_session_state() {
        let gateway = gateway_with(&[]);
        let mut conn = gateway.bind("sensor-1", 1);
        let mut base = FakeBase::default();

        conn.connect_accepted(&mut base);
        conn.outbound_addressing("room/temp").unwrap();
        conn.record_publish_alias(7, 1);
        conn.awake_requested(&mut base, || {});
        assert!(conn.has_pending_flush());
        assert_eq!(gateway.metrics().snapshot().connections, 1);

        let exec = conn.executor().clone();
        conn.teardown();

        assert_eq!(gateway.registry().session_alias_count("sensor-1"), 0);
        assert_eq!(gateway.metrics().snapshot().connections, 0);
        // The flush callback was cancelled, never fired.
        assert_eq!(gateway.metrics().snapshot().flush_signals, 0);
        // The connection's executor winds down.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(exec.is_closed());
    }

    #[tokio::test]
    async fn test_sleep_cycle_metrics_and_base_calls() {
        let gateway = gateway_with(&[]);
        let mut conn = gateway.bind("sensor-1", 1);
        let mut base = FakeBase::default();

        assert!(conn.connect_accepted(&mut base));
        assert_eq!(conn.state(), SnConnectionState::Active);

        conn.sleep_requested(&mut base, Some(Duration::from_secs(120)));
        assert_eq!(conn.state(), SnConnectionState::Asleep);
        assert_eq!(base.disconnect_requests, 1);
        assert_eq!(conn.overlay().sleep_duration(), Some(Duration::from_secs(120)));

        conn.awake_requested(&mut base, || {});
        assert_eq!(conn.state(), SnConnectionState::Awake);
        assert!(base.authenticated);

        let snapshot = gateway.metrics().snapshot();
        assert_eq!(snapshot.sleep_entries, 1);
        assert_eq!(snapshot.awake_entries, 1);
    }
}
