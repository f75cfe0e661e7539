//! Payments: the protocol's payment command, built on the versioned command model.
//!
//! Pure domain logic (no IO, no networking). A payment is a shared object
//! whose every revision is a new version; a `PaymentCommand` proposes one
//! revision and declares the revision it supersedes as its dependency.

pub mod command;
pub mod payment;

pub use command::PaymentCommand;
pub use payment::{PaymentAction, PaymentActor, PaymentObject, PaymentStatus};
