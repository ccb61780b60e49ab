#![deny(unused, dead_code)]
#![deny(clippy::all, clippy::pedantic)]
// Module naming: common pattern in domain-driven code
#![allow(clippy::module_name_repetitions)]
// Documentation style: many terms don't need backticks
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// API ergonomics: prefer simplicity over must_use annotations
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Function complexity: some functions are inherently complex
#![allow(clippy::too_many_lines)]
// Variable naming: domain terms often similar
#![allow(clippy::similar_names)]
// Format strings: allow non-inlined for readability
#![allow(clippy::uninlined_format_args)]
// Import style
#![allow(clippy::wildcard_imports)]
// Numeric casts: intentional in protocol code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
// Type defaults
#![allow(clippy::implicit_hasher)]
// Control flow style
#![allow(clippy::single_match_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
// Passing style
#![allow(clippy::needless_pass_by_value)]
// Iterator patterns
#![allow(clippy::iter_without_into_iter)]
// Explicit returns
#![allow(clippy::semicolon_if_nothing_returned)]

//! Sngate - MQTT-SN edge gateway adaptation core.
//!
//! The gateway's generic MQTT machinery (handler chain, frame codecs,
//! transport listeners, persistence) lives outside this crate. What lives
//! here is the MQTT-SN-specific adaptation surface that plugs into it:
//!
//! # Module Organization
//!
//! ## Core
//! - `core::config` - Configuration parsing and validation
//! - `core::exec` - Per-connection sequential execution context
//! - `core::telemetry` - Structured logging initialization
//!
//! ## Adaptation layer
//! - `mqttsn::alias` - Topic alias value type, wire id types, allocation
//! - `mqttsn::registry` - Per-session and predefined alias tables
//! - `mqttsn::overlay` - Sleep-cycle connection overlay state machine
//! - `mqttsn::flush` - Awake-flush one-shot coordinator
//! - `mqttsn::pipeline` - Boundary consumed by the generic handler chain
//! - `mqttsn::metrics` - Adapter counters and gauges
//!
//! ## CLI
//! - `cli` - Configuration and alias-table diagnostics

// Core infrastructure
pub mod core;

// MQTT-SN adaptation layer
pub mod mqttsn;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, exec, telemetry};
pub use mqttsn::pipeline::{SnConnection, SnGateway};
pub use mqttsn::{alias, flush, metrics, overlay, pipeline, registry};
