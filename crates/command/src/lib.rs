//! `offchain-command` — the versioned command model.
//!
//! A protocol command declares the shared-object versions it reads and the
//! versions it creates, records which party proposed it, and serializes to a
//! JSON record for the wire (NET) or for local storage (STORE). The two
//! representations differ only in that STORE carries the origin.

pub mod base;
pub mod command;
pub mod envelope;
pub mod mode;
pub mod version_map;

pub use base::CommandBase;
pub use command::{Dependencies, ProtocolCommand, SharedObject};
pub use envelope::CommandRequest;
pub use mode::{JsonMode, JsonRecord, ORIGIN_KEY, READS_KEY, RESERVED_KEYS, WRITES_KEY};
pub use version_map::{ObjectRef, VersionMap};

pub use offchain_core::{
    CommandError, CommandResult, ObjectId, PartyAddress, RequestCid, ValueObject, Version,
};
