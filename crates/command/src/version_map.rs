//! Version maps: the read and write sets of a command.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use offchain_core::{CommandError, CommandResult, ObjectId, ValueObject, Version};

use crate::mode::JsonRecord;

/// Reference to one snapshot of a shared object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: Version,
}

impl ObjectRef {
    pub fn new(object_id: ObjectId, version: impl Into<Version>) -> Self {
        Self {
            object_id,
            version: version.into(),
        }
    }
}

impl ValueObject for ObjectRef {}

/// Ordered list of object references, at most one per `object_id`.
///
/// Equality ignores insertion order: two maps are equal when they name the
/// same versions for the same objects. Serialized, a map is a JSON object
/// `{ "<object_id>": <version>, ... }`.
#[derive(Debug, Clone, Default)]
pub struct VersionMap {
    entries: Vec<ObjectRef>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from references, rejecting duplicate object ids.
    pub fn from_refs(refs: impl IntoIterator<Item = ObjectRef>) -> CommandResult<Self> {
        let mut map = Self::new();
        for r in refs {
            map.push(r)?;
        }
        Ok(map)
    }

    /// Append a reference to `object_id` at `version`.
    ///
    /// Fails with `MalformedData` if the map already names `object_id`; the
    /// map is left unchanged in that case.
    pub fn insert(&mut self, object_id: ObjectId, version: impl Into<Version>) -> CommandResult<()> {
        self.push(ObjectRef::new(object_id, version))
    }

    fn push(&mut self, r: ObjectRef) -> CommandResult<()> {
        if let Some(existing) = self.get(&r.object_id) {
            return Err(CommandError::malformed(format!(
                "object `{}` listed twice (versions {} and {})",
                r.object_id, existing, r.version
            )));
        }
        self.entries.push(r);
        Ok(())
    }

    /// Version this map names for `object_id`, if any.
    pub fn get(&self, object_id: &ObjectId) -> Option<&Version> {
        self.entries
            .iter()
            .find(|r| &r.object_id == object_id)
            .map(|r| &r.version)
    }

    pub fn contains_version(&self, version: &Version) -> bool {
        self.entries.iter().any(|r| &r.version == version)
    }

    /// The set of versions named by this map.
    pub fn versions(&self) -> BTreeSet<Version> {
        self.entries.iter().map(|r| r.version.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as a JSON object with keys in `object_id` order.
    ///
    /// The order is fixed here rather than left to the map type, so the
    /// encoding of a map never depends on how it was built.
    pub(crate) fn to_json(&self) -> Value {
        let mut sorted: Vec<&ObjectRef> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.object_id.cmp(&b.object_id));

        let mut obj = JsonRecord::new();
        for r in sorted {
            obj.insert(r.object_id.to_string(), version_to_json(&r.version));
        }
        Value::Object(obj)
    }

    /// Parse the JSON object stored under `key`.
    pub(crate) fn from_json(key: &str, value: Value) -> CommandResult<Self> {
        let Value::Object(obj) = value else {
            return Err(CommandError::malformed(format!("`{key}` must be a map")));
        };

        let mut map = Self::new();
        for (object_id, version) in obj {
            let object_id = ObjectId::new(object_id)?;
            let version: Version = serde_json::from_value(version).map_err(|_| {
                CommandError::malformed(format!(
                    "`{key}` entry for `{object_id}` is not an integer or string version"
                ))
            })?;
            map.insert(object_id, version)?;
        }
        Ok(map)
    }
}

fn version_to_json(version: &Version) -> Value {
    match version {
        Version::Number(n) => Value::from(*n),
        Version::Token(t) => Value::from(t.as_str()),
    }
}

impl PartialEq for VersionMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|r| other.get(&r.object_id) == Some(&r.version))
    }
}

impl Eq for VersionMap {}

impl<'a> IntoIterator for &'a VersionMap {
    type Item = &'a ObjectRef;
    type IntoIter = core::slice::Iter<'a, ObjectRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
