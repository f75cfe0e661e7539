//! `offchain-core` — shared building blocks for the off-chain command protocol.
//!
//! This crate contains **pure value types** (no IO, no networking): the error
//! model, identifiers for shared objects and their versions, request
//! correlation ids, and the party identity codec.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{CommandError, CommandResult};
pub use id::{ObjectId, PartyAddress, RequestCid, Version};
pub use value_object::ValueObject;
