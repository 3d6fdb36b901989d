//! Error conditions raised by the core. There is exactly one: a message of an unsupported
//! variant reaching a role's `receive` dispatcher. Everything else the core encounters (NACKs,
//! stale or duplicate messages) is a protocol event handled silently in-band, not an error.

use thiserror::Error;

/// The single core-defined error condition. Raised when a role is handed a [`crate::message::Message`]
/// variant it does not implement a handler for. This is a defect in the embedding or transport,
/// never something the core recovers from on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaxosError {
    #[error("{role} received a message variant it does not handle: {variant}")]
    InvalidMessage { role: &'static str, variant: &'static str },
}
