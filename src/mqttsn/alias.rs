//! Topic alias value types and id allocation.
//!
//! MQTT-SN shrinks frames by substituting 16-bit ids for topic strings.
//! Three alias classes exist on the wire:
//! - normal: allocated per session the first time a client publishes a
//!   previously-unseen topic in non-abbreviated form
//! - predefined: provisioned from configuration at gateway start, shared
//!   read-only by every session
//! - short: topic names of at most two characters, carried literally in the
//!   2-byte topic-data field instead of through an id table
//!
//! A fourth kind, full, marks addressing that carries the complete topic
//! string instead of an id (SUBSCRIBE frames tagged normal, and the 2.0
//! long-topic form).

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Wire addressing
// ---------------------------------------------------------------------------

/// Topic id type bits of the protocol's addressing field.
///
/// Consumed from decoded frames, never owned here; the frame codec is an
/// external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TopicIdType {
    /// Per-session dynamic alias id, or full topic text on SUBSCRIBE.
    Normal = 0x00,
    /// Configuration-provisioned alias id.
    Predefined = 0x01,
    /// Two-byte literal topic.
    Short = 0x02,
}

impl TopicIdType {
    /// Map the two-bit addressing field; unknown values belong to the
    /// caller's protocol-error path.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Normal),
            0x01 => Some(Self::Predefined),
            0x02 => Some(Self::Short),
            _ => None,
        }
    }

    pub fn wire_value(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Alias value type
// ---------------------------------------------------------------------------

/// Classification of a resolved alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicAliasKind {
    Normal,
    Predefined,
    Short,
    Full,
}

/// A topic string together with its 16-bit stand-in.
///
/// Equality and hashing are defined by `topic_name` alone; `alias_id` and
/// `kind` do not participate. Lookups throughout the registry depend on
/// this.
#[derive(Debug, Clone)]
pub struct TopicAlias {
    topic_name: String,
    alias_id: u16,
    kind: TopicAliasKind,
}

impl TopicAlias {
    /// Session-scoped dynamic alias.
    pub fn normal(topic_name: impl Into<String>, alias_id: u16) -> Self {
        Self {
            topic_name: topic_name.into(),
            alias_id,
            kind: TopicAliasKind::Normal,
        }
    }

    /// Configuration-provisioned alias.
    pub fn predefined(topic_name: impl Into<String>, alias_id: u16) -> Self {
        Self {
            topic_name: topic_name.into(),
            alias_id,
            kind: TopicAliasKind::Predefined,
        }
    }

    /// Synthesized short-topic alias. The id is the big-endian packing of
    /// the one or two topic bytes (second byte zero for a single-character
    /// topic), which is exactly the wire form of the topic-data field.
    pub fn short(topic_name: impl Into<String>) -> Self {
        let topic_name = topic_name.into();
        let bytes = topic_name.as_bytes();
        let first = bytes.first().copied().unwrap_or(0);
        let second = bytes.get(1).copied().unwrap_or(0);
        Self {
            alias_id: u16::from_be_bytes([first, second]),
            topic_name,
            kind: TopicAliasKind::Short,
        }
    }

    /// Full-topic addressing; carries no id.
    pub fn full(topic_name: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            alias_id: 0,
            kind: TopicAliasKind::Full,
        }
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn alias_id(&self) -> u16 {
        self.alias_id
    }

    pub fn kind(&self) -> TopicAliasKind {
        self.kind
    }

    /// Produce the topic-data field for an outbound frame: the big-endian
    /// id for id-carrying kinds, the literal topic bytes for full
    /// addressing.
    pub fn encode_topic_data(&self) -> Vec<u8> {
        match self.kind {
            TopicAliasKind::Full => self.topic_name.as_bytes().to_vec(),
            TopicAliasKind::Normal | TopicAliasKind::Predefined | TopicAliasKind::Short => {
                self.alias_id.to_be_bytes().to_vec()
            }
        }
    }
}

impl PartialEq for TopicAlias {
    fn eq(&self, other: &Self) -> bool {
        self.topic_name == other.topic_name
    }
}

impl Eq for TopicAlias {}

impl Hash for TopicAlias {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.topic_name.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Compute the next free alias id above the current high-water mark.
///
/// With no ids in use the floor `start_at` is returned. Otherwise the scan
/// starts just above the highest used id; ids freed below the maximum are
/// not reused until the space is otherwise exhausted. Callers invoke this
/// only on first registration of an unseen topic name, never per publish.
pub fn next_available(used: &HashSet<u16>, start_at: u16) -> Result<u16, TopicAliasError> {
    if used.is_empty() {
        return Ok(start_at);
    }
    let highest = used.iter().copied().max().unwrap_or(start_at);
    if highest == u16::MAX {
        return Err(TopicAliasError::SpaceExhausted);
    }
    for candidate in highest + 1..=u16::MAX {
        if !used.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(TopicAliasError::SpaceExhausted)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the alias surface, distinguishable so the handler chain can
/// log malformed frames, unknown ids and exhaustion differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicAliasError {
    /// Short topic data must be exactly two bytes.
    #[error("short topic data must be 2 bytes, got {0}")]
    ShortTopicLength(usize),
    /// The 2-byte id field had a different length.
    #[error("topic id field must be 2 bytes, got {0}")]
    IdFieldLength(usize),
    /// Topic bytes were not valid UTF-8.
    #[error("topic data is not valid UTF-8")]
    TopicNotUtf8,
    /// Predefined id absent from the provisioned table.
    #[error("predefined alias {0} is not provisioned")]
    UnknownPredefinedAlias(u16),
    /// Normal id absent from the client's session table.
    #[error("topic alias {0} is not registered for this session")]
    UnknownSessionAlias(u16),
    /// The client's 16-bit alias space is fully consumed.
    #[error("topic alias space exhausted for this session")]
    SpaceExhausted,
    /// Predefined alias id 0 is reserved.
    #[error("predefined alias id 0 is reserved (topic {0})")]
    ZeroAlias(String),
    /// Two predefined entries share an id.
    #[error("duplicate predefined alias {0}")]
    DuplicatePredefinedAlias(u16),
}

impl TopicAliasError {
    /// Malformed topic-data input; fatal for the current frame.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::ShortTopicLength(_) | Self::IdFieldLength(_) | Self::TopicNotUtf8
        )
    }

    /// Id lookup that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownPredefinedAlias(_) | Self::UnknownSessionAlias(_)
        )
    }

    /// Allocation failure; the caller rejects one registration and keeps
    /// the session alive.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::SpaceExhausted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
