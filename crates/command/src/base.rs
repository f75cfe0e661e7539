//! The part of a command every variant shares: read set, write set, origin.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, trace, warn};

use offchain_core::{CommandError, CommandResult, ObjectId, PartyAddress, Version};

use crate::mode::{JsonMode, JsonRecord, ORIGIN_KEY, READS_KEY, WRITES_KEY};
use crate::version_map::VersionMap;

/// Base record composed into every concrete command.
///
/// `reads` and `writes` are fixed once the command is built. The origin starts
/// unset and transitions to set at most once; the transition goes through a
/// `OnceLock`, so concurrent `set_origin` calls cannot both win.
#[derive(Debug, Clone, Default)]
pub struct CommandBase {
    reads: VersionMap,
    writes: VersionMap,
    origin: OnceLock<PartyAddress>,
}

impl CommandBase {
    pub fn new(reads: VersionMap, writes: VersionMap) -> Self {
        Self {
            reads,
            writes,
            origin: OnceLock::new(),
        }
    }

    /// Builder step: declare a dependency on `object_id` at `version`.
    pub fn with_read(mut self, object_id: ObjectId, version: impl Into<Version>) -> CommandResult<Self> {
        self.reads.insert(object_id, version)?;
        Ok(self)
    }

    /// Builder step: declare that the command creates `object_id` at `version`.
    pub fn with_write(mut self, object_id: ObjectId, version: impl Into<Version>) -> CommandResult<Self> {
        self.writes.insert(object_id, version)?;
        Ok(self)
    }

    pub fn reads(&self) -> &VersionMap {
        &self.reads
    }

    pub fn writes(&self) -> &VersionMap {
        &self.writes
    }

    pub fn origin(&self) -> Option<&PartyAddress> {
        self.origin.get()
    }

    /// Attest the party that proposed this command.
    ///
    /// Setting the same origin again is a no-op. Setting a different one fails
    /// with `StateConflict` and leaves the attested origin in place.
    pub fn set_origin(&self, origin: PartyAddress) -> CommandResult<()> {
        match self.origin.set(origin) {
            Ok(()) => {
                if let Some(origin) = self.origin.get() {
                    debug!(origin = %origin, "command origin attested");
                }
                Ok(())
            }
            Err(rejected) => match self.origin.get() {
                Some(current) if *current == rejected => Ok(()),
                current => {
                    warn!(
                        current = ?current.map(PartyAddress::as_str),
                        rejected = %rejected,
                        "refusing to reassign command origin"
                    );
                    Err(CommandError::state_conflict(format!(
                        "command origin cannot be reassigned (attested: {}, attempted: {rejected})",
                        current.map(PartyAddress::as_str).unwrap_or("<unset>")
                    )))
                }
            },
        }
    }

    /// Versions this command depends on.
    pub fn dependencies(&self) -> BTreeSet<Version> {
        self.reads.versions()
    }

    /// Versions this command creates.
    pub fn new_object_versions(&self) -> BTreeSet<Version> {
        self.writes.versions()
    }

    /// Serialize the base fields.
    ///
    /// `_reads` and `_writes` are always present; `_origin` only in
    /// [`JsonMode::Store`] and only once an origin is attested.
    pub fn to_json_record(&self, mode: JsonMode) -> JsonRecord {
        let mut record = JsonRecord::new();
        record.insert(READS_KEY.to_string(), self.reads.to_json());
        record.insert(WRITES_KEY.to_string(), self.writes.to_json());

        if mode.carries_origin() {
            if let Some(origin) = self.origin() {
                record.insert(ORIGIN_KEY.to_string(), Value::from(origin.as_str()));
            }
        }

        trace!(?mode, reads = self.reads.len(), writes = self.writes.len(), "serialized command base");
        record
    }

    /// Extract the base fields from `record`, removing them.
    ///
    /// Whatever is left in `record` afterwards is the variant payload. In
    /// [`JsonMode::Net`] an `_origin` key is discarded unread. On error the
    /// record is left untouched.
    pub(crate) fn from_json_record(record: &mut JsonRecord, mode: JsonMode) -> CommandResult<Self> {
        let reads = parse_version_map(record, READS_KEY)?;
        let writes = parse_version_map(record, WRITES_KEY)?;
        let base = Self::new(reads, writes);

        if mode.carries_origin() {
            if let Some(encoded) = record.get(ORIGIN_KEY) {
                let Value::String(encoded) = encoded else {
                    warn!("stored command has a non-string origin");
                    return Err(CommandError::malformed("`_origin` must be a string"));
                };
                let origin = PartyAddress::from_encoded_str(encoded).inspect_err(|e| {
                    warn!(error = %e, "stored command has an undecodable origin");
                })?;
                base.set_origin(origin)?;
            }
        }

        for key in [READS_KEY, WRITES_KEY, ORIGIN_KEY] {
            record.remove(key);
        }
        Ok(base)
    }
}

fn parse_version_map(record: &JsonRecord, key: &str) -> CommandResult<VersionMap> {
    let value = record.get(key).ok_or_else(|| {
        warn!(key, "command record is missing a version map");
        CommandError::malformed(format!("missing `{key}` map"))
    })?;
    VersionMap::from_json(key, value.clone())
}

impl PartialEq for CommandBase {
    fn eq(&self, other: &Self) -> bool {
        self.reads == other.reads && self.writes == other.writes && self.origin() == other.origin()
    }
}

impl Eq for CommandBase {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn oid(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    fn party(s: &str) -> PartyAddress {
        PartyAddress::from_encoded_str(s).unwrap()
    }

    fn sample() -> CommandBase {
        CommandBase::default()
            .with_read(oid("obj1"), 5)
            .unwrap()
            .with_write(oid("obj2"), 1)
            .unwrap()
    }

    fn record(value: serde_json::Value) -> JsonRecord {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("Expected a JSON object"),
        }
    }

    #[test]
    fn origin_is_unset_until_attested() {
        let base = sample();
        assert_eq!(base.origin(), None);

        base.set_origin(party("vasp-a")).unwrap();
        assert_eq!(base.origin(), Some(&party("vasp-a")));
    }

    #[test]
    fn setting_the_same_origin_twice_is_a_no_op() {
        let base = sample();
        base.set_origin(party("vasp-a")).unwrap();
        base.set_origin(party("vasp-a")).unwrap();
        assert_eq!(base.origin(), Some(&party("vasp-a")));
    }

    #[test]
    fn reassigning_origin_is_a_state_conflict() {
        let base = sample();
        base.set_origin(party("vasp-a")).unwrap();

        let err = base.set_origin(party("vasp-b")).unwrap_err();
        match err {
            CommandError::StateConflict(_) => {}
            other => panic!("Expected StateConflict, got {other:?}"),
        }
        assert_eq!(base.origin(), Some(&party("vasp-a")));
    }

    #[test]
    fn concurrent_origin_attestation_has_exactly_one_winner() {
        let base = sample();
        let outcomes: Vec<CommandResult<()>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let base = &base;
                    s.spawn(move || base.set_origin(party(&format!("vasp-{i}"))))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(base.origin().is_some());
    }

    #[test]
    fn derived_sets_track_reads_and_writes() {
        let base = sample();
        assert_eq!(base.dependencies(), BTreeSet::from([Version::from(5)]));
        assert_eq!(base.new_object_versions(), BTreeSet::from([Version::from(1)]));
        assert!(CommandBase::default().dependencies().is_empty());
    }

    #[test]
    fn the_same_object_may_be_read_and_written() {
        let base = CommandBase::default()
            .with_read(oid("payment"), "v1")
            .unwrap()
            .with_write(oid("payment"), "v2")
            .unwrap();
        assert_eq!(base.dependencies(), BTreeSet::from([Version::from("v1")]));
        assert_eq!(base.new_object_versions(), BTreeSet::from([Version::from("v2")]));
    }

    #[test]
    fn store_record_carries_origin_and_net_record_does_not() {
        let base = sample();
        assert_eq!(
            serde_json::Value::Object(base.to_json_record(JsonMode::Store)),
            json!({"_reads": {"obj1": 5}, "_writes": {"obj2": 1}})
        );

        base.set_origin(party("vasp-a")).unwrap();
        let store = base.to_json_record(JsonMode::Store);
        let net = base.to_json_record(JsonMode::Net);
        assert_eq!(store.get(ORIGIN_KEY), Some(&json!("vasp-a")));
        assert!(!net.contains_key(ORIGIN_KEY));
    }

    #[test]
    fn from_json_record_leaves_only_the_payload_behind() {
        let mut rec = record(json!({
            "_reads": {"obj1": 5},
            "_writes": {"obj2": 1},
            "_origin": "vasp-a",
            "note": "hello"
        }));

        let base = CommandBase::from_json_record(&mut rec, JsonMode::Store).unwrap();
        assert_eq!(base.origin(), Some(&party("vasp-a")));
        assert_eq!(serde_json::Value::Object(rec), json!({"note": "hello"}));
    }

    #[test]
    fn net_mode_never_reads_origin() {
        let mut rec = record(json!({"_reads": {}, "_writes": {}, "_origin": "vasp-a"}));
        let base = CommandBase::from_json_record(&mut rec, JsonMode::Net).unwrap();
        assert_eq!(base.origin(), None);
        assert!(rec.is_empty());
    }

    #[test]
    fn net_mode_ignores_even_an_undecodable_origin() {
        let mut rec = record(json!({"_reads": {}, "_writes": {}, "_origin": 42}));
        assert!(CommandBase::from_json_record(&mut rec, JsonMode::Net).is_ok());
    }

    #[test]
    fn missing_maps_and_bad_origins_are_malformed() {
        let cases = [
            json!({"_writes": {}}),
            json!({"_reads": {}}),
            json!({"_reads": [], "_writes": {}}),
            json!({"_reads": {}, "_writes": {}, "_origin": "Not Canonical"}),
            json!({"_reads": {}, "_writes": {}, "_origin": 42}),
        ];
        for case in cases {
            let mut rec = record(case.clone());
            let err = CommandBase::from_json_record(&mut rec, JsonMode::Store).unwrap_err();
            match err {
                CommandError::MalformedData(_) => {}
                other => panic!("Expected MalformedData for {case}, got {other:?}"),
            }
        }
    }

    #[test]
    fn a_failed_decode_leaves_the_record_untouched() {
        let cases = [
            json!({"_reads": {"obj1": 5}, "note": "hello"}),
            json!({"_reads": {"obj1": 5}, "_writes": {"obj2": 1}, "_origin": 42}),
        ];
        for case in cases {
            let mut rec = record(case.clone());
            assert!(CommandBase::from_json_record(&mut rec, JsonMode::Store).is_err());
            assert_eq!(serde_json::Value::Object(rec), case);
        }
    }

    #[test]
    fn equality_is_structural_over_reads_writes_and_origin() {
        let a = sample();
        let b = sample();
        assert_eq!(a, b);

        a.set_origin(party("vasp-a")).unwrap();
        assert_ne!(a, b);

        b.set_origin(party("vasp-a")).unwrap();
        assert_eq!(a, b);
    }
}
