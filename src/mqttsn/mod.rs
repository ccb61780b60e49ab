//! MQTT-SN adaptation layer.
//!
//! This module is the MQTT-SN-specific surface that plugs into the
//! gateway's generic MQTT machinery:
//! - Topic alias classes and id allocation
//! - Per-session and predefined alias tables
//! - Sleep-cycle connection overlay (active/asleep/awake)
//! - Awake-flush one-shot coordination
//! - The pipeline boundary the generic handler chain calls
//! - Adapter metrics

pub mod alias;
pub mod flush;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod registry;

pub use self::alias::{next_available, TopicAlias, TopicAliasError, TopicAliasKind, TopicIdType};
pub use self::flush::{AwakeFlushCoordinator, FlushCallback};
pub use self::metrics::{AdapterMetrics, AdapterMetricsSnapshot};
pub use self::overlay::{ConnectionOverlay, SessionControl, SnConnectionState};
pub use self::pipeline::{OutboundAddressing, QueuedPublish, SnConnection, SnGateway};
pub use self::registry::{PredefinedAliasTable, TopicAliasRegistry};
