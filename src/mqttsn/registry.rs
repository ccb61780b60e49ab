//! Per-session and predefined topic-alias tables.
//!
//! The registry owns two stores: a process-wide predefined table built once
//! from configuration and immutable afterward, and a lazily-populated
//! session table keyed by client id. Different clients' frames run
//! concurrently, so the top level of the session table takes a short
//! read/write lock; each client's bucket carries its own mutex so
//! registration is serialized per client, never globally.

use crate::mqttsn::alias::{next_available, TopicAlias, TopicAliasError, TopicIdType};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One client's alias_id -> alias map, lock-scoped to that client.
type AliasBucket = Arc<Mutex<HashMap<u16, TopicAlias>>>;

// ---------------------------------------------------------------------------
// Predefined table
// ---------------------------------------------------------------------------

/// Configuration-provisioned alias table, shared read-only by all sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredefinedAliasTable {
    by_id: HashMap<u16, TopicAlias>,
}

impl PredefinedAliasTable {
    /// Build the table from `(alias_id, topic_name)` pairs. Rejects the
    /// reserved id 0 and duplicate ids; runs once at gateway start.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (u16, String)>,
    ) -> Result<Self, TopicAliasError> {
        let mut by_id = HashMap::new();
        for (alias_id, topic_name) in entries {
            if alias_id == 0 {
                return Err(TopicAliasError::ZeroAlias(topic_name));
            }
            if by_id
                .insert(alias_id, TopicAlias::predefined(topic_name, alias_id))
                .is_some()
            {
                return Err(TopicAliasError::DuplicatePredefinedAlias(alias_id));
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, alias_id: u16) -> Option<&TopicAlias> {
        self.by_id.get(&alias_id)
    }

    pub fn find_by_name(&self, topic_name: &str) -> Option<&TopicAlias> {
        self.by_id
            .values()
            .find(|alias| alias.topic_name() == topic_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicAlias> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Resolve/register/clear surface over the session and predefined tables.
#[derive(Debug)]
pub struct TopicAliasRegistry {
    predefined: Arc<PredefinedAliasTable>,
    sessions: RwLock<HashMap<String, AliasBucket>>,
}

impl TopicAliasRegistry {
    pub fn new(predefined: Arc<PredefinedAliasTable>) -> Self {
        Self {
            predefined,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Decode the topic-data field of an inbound frame into a topic name.
    ///
    /// Short data is the literal topic: two bytes, with a zero second byte
    /// marking a single-character topic. Predefined and normal data carry a
    /// big-endian id looked up in the respective table. SUBSCRIBE frames
    /// tag full topic text as normal; `read_normal_as_full` selects that
    /// interpretation.
    pub fn read_topic_name(
        &self,
        client_id: &str,
        id_type: TopicIdType,
        topic_data: &[u8],
        read_normal_as_full: bool,
    ) -> Result<String, TopicAliasError> {
        match id_type {
            TopicIdType::Short => {
                if topic_data.len() != 2 {
                    return Err(TopicAliasError::ShortTopicLength(topic_data.len()));
                }
                let literal = if topic_data[1] == 0x00 {
                    &topic_data[..1]
                } else {
                    &topic_data[..2]
                };
                decode_utf8(literal)
            }
            TopicIdType::Predefined => {
                let alias_id = decode_alias_id(topic_data)?;
                self.predefined
                    .get(alias_id)
                    .map(|alias| alias.topic_name().to_string())
                    .ok_or(TopicAliasError::UnknownPredefinedAlias(alias_id))
            }
            TopicIdType::Normal if read_normal_as_full => decode_utf8(topic_data),
            TopicIdType::Normal => {
                let alias_id = decode_alias_id(topic_data)?;
                let bucket = self.sessions.read().get(client_id).cloned();
                bucket
                    .and_then(|bucket| {
                        bucket
                            .lock()
                            .get(&alias_id)
                            .map(|alias| alias.topic_name().to_string())
                    })
                    .ok_or(TopicAliasError::UnknownSessionAlias(alias_id))
            }
        }
    }

    /// Look up the alias to use for an outbound frame addressing
    /// `topic_name`.
    ///
    /// Names of at most two characters synthesize a short alias without
    /// touching any table. Longer names scan the client's session bucket
    /// first, then the predefined table.
    pub fn read_topic_alias(&self, client_id: &str, topic_name: &str) -> Option<TopicAlias> {
        if topic_name.len() <= 2 {
            return Some(TopicAlias::short(topic_name));
        }
        if let Some(bucket) = self.sessions.read().get(client_id).cloned() {
            let guard = bucket.lock();
            if let Some(alias) = guard
                .values()
                .find(|alias| alias.topic_name() == topic_name)
            {
                return Some(alias.clone());
            }
        }
        self.predefined.find_by_name(topic_name).cloned()
    }

    /// Allocate (or return the existing) session alias id for a topic.
    ///
    /// Idempotent per `(client_id, topic_name)`; the bucket mutex makes
    /// back-to-back registrations for one client safe while other clients
    /// proceed unblocked.
    pub fn register(&self, client_id: &str, topic_name: &str) -> Result<u16, TopicAliasError> {
        let bucket = self.bucket_or_create(client_id);
        let mut guard = bucket.lock();
        if let Some(existing) = guard
            .values()
            .find(|alias| alias.topic_name() == topic_name)
        {
            return Ok(existing.alias_id());
        }
        let used: HashSet<u16> = guard.keys().copied().collect();
        let alias_id = next_available(&used, 1)?;
        guard.insert(alias_id, TopicAlias::normal(topic_name, alias_id));
        Ok(alias_id)
    }

    /// Drop a client's entire bucket; safe to call when none exists.
    pub fn clear_session(&self, client_id: &str) {
        self.sessions.write().remove(client_id);
    }

    /// Number of aliases registered for one client.
    pub fn session_alias_count(&self, client_id: &str) -> usize {
        self.sessions
            .read()
            .get(client_id)
            .map(|bucket| bucket.lock().len())
            .unwrap_or(0)
    }

    /// Number of clients with a session bucket.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn predefined(&self) -> &PredefinedAliasTable {
        &self.predefined
    }

    fn bucket_or_create(&self, client_id: &str) -> AliasBucket {
        if let Some(bucket) = self.sessions.read().get(client_id) {
            return bucket.clone();
        }
        self.sessions
            .write()
            .entry(client_id.to_string())
            .or_default()
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Field decoding
// ---------------------------------------------------------------------------

fn decode_alias_id(topic_data: &[u8]) -> Result<u16, TopicAliasError> {
    if topic_data.len() != 2 {
        return Err(TopicAliasError::IdFieldLength(topic_data.len()));
    }
    Ok(u16::from_be_bytes([topic_data[0], topic_data[1]]))
}

fn decode_utf8(topic_data: &[u8]) -> Result<String, TopicAliasError> {
    std::str::from_utf8(topic_data)
        .map(str::to_string)
        .map_err(|_| TopicAliasError::TopicNotUtf8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
