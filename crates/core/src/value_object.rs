//! Value object trait: equality by value, not identity.
//!
//! Everything exchanged between the two parties is a value: object references,
//! version tokens, party identities and materialized shared-object snapshots.
//! Two replicas agree on a value exactly when the values compare equal.

use crate::id::{ObjectId, PartyAddress, RequestCid, Version};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A snapshot of a
/// shared object at some version never changes; a new version is a new value.
///
/// ## Design Constraints
///
/// The trait requires:
/// - **Clone**: values are copied freely between commands, stores and envelopes
/// - **PartialEq**: replicas are compared by their attribute values
/// - **Debug**: values show up in logs and test failures
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Note {
///     version: Version,
///     text: String,
/// }
///
/// impl ValueObject for Note {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

impl ValueObject for ObjectId {}
impl ValueObject for PartyAddress {}
impl ValueObject for RequestCid {}
impl ValueObject for Version {}
