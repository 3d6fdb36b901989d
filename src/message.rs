//! A module which contains the definition of the messages exchanged by the Proposer, Acceptor
//! and Learner state machines. Messages are opaque values: the core never inspects `from_uid`
//! other than as a set-membership key, and an embedding transport is free to serialize,
//! broadcast, retry or drop them as it sees fit.

use serde::{Deserialize, Serialize};

use crate::proposal_id::ProposalID;

/// The tagged union of all message variants a role's `receive` entry point can be handed.
/// Presenting a role with a variant it does not handle is a programming error (see
/// [`crate::error::PaxosError::InvalidMessage`]), never a silent drop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message<U, V> {
    Prepare(PrepareMsg<U>),
    Promise(PromiseMsg<U, V>),
    Accept(AcceptMsg<U, V>),
    Accepted(AcceptedMsg<U, V>),
    Nack(NackMsg<U>),
    Resolution(ResolutionMsg<U, V>),
}

/// Phase 1a: broadcast from one Proposer to all Acceptors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrepareMsg<U> {
    pub from_uid: U,
    pub proposal_id: ProposalID<U>,
}

/// Phase 1b: sent from one Acceptor to the Proposer named in `proposer_uid`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromiseMsg<U, V> {
    pub from_uid: U,
    pub proposer_uid: U,
    pub proposal_id: ProposalID<U>,

    /// The highest id this Acceptor had previously accepted, if any. Jointly optional with
    /// `last_accepted_value`: either both are present or both are absent.
    pub last_accepted_id: Option<ProposalID<U>>,
    pub last_accepted_value: Option<V>,
}

/// Phase 1c: a negative acknowledgement, sent in response to either a `Prepare` or an `Accept`
/// whose proposal id is below what the Acceptor has already promised.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NackMsg<U> {
    pub from_uid: U,
    pub proposer_uid: U,
    pub proposal_id: ProposalID<U>,
    pub promised_proposal_id: ProposalID<U>,
}

/// Phase 2a: broadcast from one Proposer to all Acceptors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AcceptMsg<U, V> {
    pub from_uid: U,
    pub proposal_id: ProposalID<U>,
    pub proposal_value: V,
}

/// Phase 2b: sent from one Acceptor to the Learners (and/or the Proposer).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AcceptedMsg<U, V> {
    pub from_uid: U,
    pub proposal_id: ProposalID<U>,
    pub proposal_value: V,
}

/// Emitted once a Learner observes a quorum of `Accepted` messages agreeing on one value; may be
/// re-emitted for late-arriving `Accepted`s after resolution so that late learners catch up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResolutionMsg<U, V> {
    pub from_uid: U,
    pub value: V,
}

impl<U, V> Message<U, V> {
    /// The variant's name, used only to build a readable [`crate::error::PaxosError::InvalidMessage`].
    pub fn variant_name(&self) -> &'static str {
        match self {
            Message::Prepare(_) => "Prepare",
            Message::Promise(_) => "Promise",
            Message::Accept(_) => "Accept",
            Message::Accepted(_) => "Accepted",
            Message::Nack(_) => "Nack",
            Message::Resolution(_) => "Resolution",
        }
    }
}
