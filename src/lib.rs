//! An implementation of single-decree Paxos as a set of pure, composable state machines.
//!
//! This crate provides the Proposer, Acceptor and Learner roles, plus a [`instance::PaxosInstance`]
//! that composes all three for a node that plays every part. It is deliberately the algorithmic
//! kernel only: there is no network transport, no durable persistence, no timers or
//! retransmission policy, and no multi-decree (log replication) layering here. Those are the
//! responsibility of an embedding transport; see each role's doc comments for the contract it
//! expects from that embedder (in particular [`acceptor::Acceptor::receive_prepare`] and
//! [`acceptor::Acceptor::receive_accept`] on when persistence must happen).
//!
//! Every operation in this crate is synchronous, deterministic given its inputs and current
//! state, and returns before the next message is consumed. There are no background tasks and no
//! async suspension points: concurrency (serializing concurrent access to a role instance,
//! ordering persistence ahead of network sends, performing I/O outside any lock) is entirely the
//! embedder's concern.

pub mod acceptor;
pub mod error;
pub mod instance;
pub mod learner;
pub mod message;
pub mod proposal_id;
pub mod proposer;

pub use acceptor::Acceptor;
pub use error::PaxosError;
pub use instance::PaxosInstance;
pub use learner::Learner;
pub use message::Message;
pub use proposal_id::ProposalID;
pub use proposer::Proposer;
