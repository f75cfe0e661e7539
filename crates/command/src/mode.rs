//! Serialization targets and the shared record shape.

use serde::{Deserialize, Serialize};

/// JSON object a command serializes to.
///
/// Version maps inside a record are written in `object_id` order (see
/// `VersionMap`), so a record's encoding does not depend on the order its
/// reads and writes were declared in.
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// Map of `object_id -> version` the command depends on.
pub const READS_KEY: &str = "_reads";
/// Map of `object_id -> version` the command creates.
pub const WRITES_KEY: &str = "_writes";
/// Encoded origin party; STORE records only.
pub const ORIGIN_KEY: &str = "_origin";

/// Keys owned by the base model. Command payloads may not use them.
pub const RESERVED_KEYS: [&str; 3] = [READS_KEY, WRITES_KEY, ORIGIN_KEY];

/// Where a serialized command is going.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonMode {
    /// Transmission to the other party. Never carries the origin: the peer
    /// learns who sent a command from the channel, not from the payload.
    Net,
    /// Local durable storage. Carries the origin when one is attested.
    Store,
}

impl JsonMode {
    /// Whether records in this mode carry the `_origin` field.
    pub fn carries_origin(self) -> bool {
        matches!(self, JsonMode::Store)
    }
}

pub(crate) fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
