use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::warn;

use offchain_core::{
    CommandError, CommandResult, ObjectId, PartyAddress, RequestCid, ValueObject, Version,
};

use crate::base::CommandBase;
use crate::mode::{JsonMode, JsonRecord, is_reserved};
use crate::version_map::ObjectRef;

/// A materialized snapshot of a shared object at one version.
pub trait SharedObject: ValueObject + Send + Sync + 'static {
    /// Logical object this snapshot belongs to.
    fn object_id(&self) -> &ObjectId;

    fn version(&self) -> &Version;

    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.object_id().clone(), self.version().clone())
    }
}

/// Shared objects resolved for a command's dependencies.
///
/// Keyed by `(object_id, version)`: versions are only unique within one
/// object's lineage, so two different objects may resolve at the same version.
/// Built by whoever owns the object store before asking a command to
/// materialize the objects it creates.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependencies<O> {
    objects: BTreeMap<ObjectRef, O>,
}

impl<O: SharedObject> Dependencies<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from resolved objects; see [`insert`](Self::insert).
    pub fn from_objects(objects: impl IntoIterator<Item = O>) -> CommandResult<Self> {
        let mut deps = Self::new();
        for object in objects {
            deps.insert(object)?;
        }
        Ok(deps)
    }

    /// Add a resolved object under its own `(object_id, version)`.
    ///
    /// Re-adding an identical snapshot is a no-op. A different snapshot under
    /// the same reference fails with `MalformedData` and the existing one is kept.
    pub fn insert(&mut self, object: O) -> CommandResult<()> {
        let key = object.object_ref();
        match self.objects.get(&key) {
            Some(existing) if *existing == object => Ok(()),
            Some(_) => Err(CommandError::malformed(format!(
                "conflicting snapshots resolved for `{}` at version {}",
                key.object_id, key.version
            ))),
            None => {
                self.objects.insert(key, object);
                Ok(())
            }
        }
    }

    /// Snapshot of `object_id` at `version`.
    pub fn get(&self, object_id: &ObjectId, version: &Version) -> Option<&O> {
        self.objects
            .get(&ObjectRef::new(object_id.clone(), version.clone()))
    }

    /// All resolved snapshots at `version`, whatever object they belong to.
    pub fn at_version<'a>(&'a self, version: &'a Version) -> impl Iterator<Item = &'a O> + 'a {
        self.objects
            .iter()
            .filter(move |(r, _)| &r.version == version)
            .map(|(_, o)| o)
    }

    pub fn contains(&self, object_ref: &ObjectRef) -> bool {
        self.objects.contains_key(object_ref)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<O> Default for Dependencies<O> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
    }
}

/// A business command exchanged between the two parties (command abstraction).
///
/// Every command is built from a [`CommandBase`] (read set, write set, origin)
/// plus a variant-specific payload. Implementors supply four things:
///
/// - [`base`](Self::base): access to the composed base record
/// - [`materialize`](Self::materialize): build the object a declared write creates
/// - [`write_payload`](Self::write_payload) / [`from_payload`](Self::from_payload):
///   the variant's half of the two-stage JSON codec
///
/// Everything else is provided on top of those and must not be overridden in
/// ways that change its contract.
///
/// ## Serialization
///
/// Serializing runs in two stages: the base writes `_reads`, `_writes` and (in
/// STORE mode) `_origin`, then the variant adds its own fields. Deserializing
/// mirrors this: the base removes its keys and hands the remainder to the
/// variant. Variant fields may not reuse the base's reserved keys.
///
/// ## Design Constraints
///
/// Commands must be:
/// - **Cloneable**: a command is stored locally and also sent to the peer
/// - **Send + Sync**: fully built commands are read from any thread
/// - **PartialEq**: replicas compare commands structurally
pub trait ProtocolCommand: Clone + PartialEq + core::fmt::Debug + Send + Sync + 'static {
    /// Shared object type this command creates.
    type Object: SharedObject;

    /// Stable type tag, used in request envelopes and cid derivation.
    const COMMAND_TYPE: &'static str;

    fn base(&self) -> &CommandBase;

    /// Build the snapshot for `version`.
    ///
    /// Only ever called through [`object`](Self::object), which has already
    /// checked that `version` is one of this command's writes and that every
    /// `(object_id, version)` in the read set is present in `dependencies`.
    fn materialize(
        &self,
        version: &Version,
        dependencies: &Dependencies<Self::Object>,
    ) -> CommandResult<Self::Object>;

    /// Add the variant's own fields to `record`. Called in both modes.
    fn write_payload(&self, record: &mut JsonRecord, mode: JsonMode) -> CommandResult<()>;

    /// Rebuild the command from an already-decoded base and the remaining fields.
    fn from_payload(base: CommandBase, payload: JsonRecord, mode: JsonMode) -> CommandResult<Self>;

    /// Correlation id for the request that carries this command.
    ///
    /// Derived from the NET record, so it depends only on reads, writes and
    /// payload: never on the origin.
    fn request_cid(&self) -> CommandResult<RequestCid> {
        let record = self.to_json_record(JsonMode::Net)?;
        let canonical = serde_json::to_vec(&record)?;
        Ok(RequestCid::derive(Self::COMMAND_TYPE, &canonical))
    }

    fn origin(&self) -> Option<&PartyAddress> {
        self.base().origin()
    }

    /// See [`CommandBase::set_origin`].
    fn set_origin(&self, origin: PartyAddress) -> CommandResult<()> {
        self.base().set_origin(origin)
    }

    fn dependencies(&self) -> BTreeSet<Version> {
        self.base().dependencies()
    }

    fn new_object_versions(&self) -> BTreeSet<Version> {
        self.base().new_object_versions()
    }

    /// Materialize the shared object this command creates at `version`.
    fn object(
        &self,
        version: &Version,
        dependencies: &Dependencies<Self::Object>,
    ) -> CommandResult<Self::Object> {
        if !self.base().writes().contains_version(version) {
            return Err(CommandError::unknown_version(version.clone()));
        }
        if let Some(missing) = self.base().reads().iter().find(|r| !dependencies.contains(r)) {
            return Err(CommandError::missing_dependency(missing.version.clone()));
        }
        self.materialize(version, dependencies)
    }

    /// Serialize to a JSON record for `mode`.
    fn to_json_record(&self, mode: JsonMode) -> CommandResult<JsonRecord> {
        let mut record = self.base().to_json_record(mode);

        let mut payload = JsonRecord::new();
        self.write_payload(&mut payload, mode)?;
        for (key, value) in payload {
            if is_reserved(&key) {
                return Err(CommandError::malformed(format!(
                    "{} payload uses reserved key `{key}`",
                    Self::COMMAND_TYPE
                )));
            }
            record.insert(key, value);
        }

        Ok(record)
    }

    /// Rebuild a command from a record produced by [`to_json_record`](Self::to_json_record).
    fn from_json_record(mut record: JsonRecord, mode: JsonMode) -> CommandResult<Self> {
        let base = CommandBase::from_json_record(&mut record, mode)?;
        Self::from_payload(base, record, mode)
    }

    fn to_json_string(&self, mode: JsonMode) -> CommandResult<String> {
        Ok(serde_json::to_string(&self.to_json_record(mode)?)?)
    }

    fn from_json_str(text: &str, mode: JsonMode) -> CommandResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(record) => Self::from_json_record(record, mode),
            _ => {
                warn!(command_type = Self::COMMAND_TYPE, "command JSON is not an object");
                Err(CommandError::malformed("command JSON must be an object"))
            }
        }
    }
}
