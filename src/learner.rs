//! The Learner role: counts `Accepted` messages per proposal id, migrates an acceptor's vote
//! when it accepts a higher id, and detects the quorum that resolves the instance.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;

use crate::error::PaxosError;
use crate::message::{AcceptedMsg, Message, ResolutionMsg};
use crate::proposal_id::ProposalID;

/// Per-proposal bookkeeping while an instance is unresolved. `accept_count` is the monotone
/// total of distinct acceptors ever counted toward this proposal, compared against quorum;
/// `retain_count` is the number currently supporting it and governs garbage collection once an
/// acceptor withdraws its vote in favor of a higher proposal.
struct ProposalStatus<U, V> {
    accept_count: usize,
    retain_count: usize,
    acceptors: HashSet<U>,
    value: V,
}

impl<U: Eq + Hash, V> ProposalStatus<U, V> {
    fn new(value: V) -> Self {
        ProposalStatus {
            accept_count: 0,
            retain_count: 0,
            acceptors: HashSet::new(),
            value,
        }
    }
}

/// Tracks `Accepted` messages until a quorum agrees on one proposal id, then discards its
/// per-proposal bookkeeping: once any proposal reaches quorum, Paxos's safety argument guarantees
/// no other value can ever reach quorum, so there is nothing left worth retaining.
pub struct Learner<U, V> {
    network_uid: U,
    quorum_size: usize,

    proposals: HashMap<ProposalID<U>, ProposalStatus<U, V>>,
    acceptors: HashMap<U, ProposalID<U>>,

    final_value: Option<V>,
    final_proposal_id: Option<ProposalID<U>>,
    final_acceptors: Option<HashSet<U>>,
}

impl<U, V> Learner<U, V>
where
    U: Clone + Eq + Hash + Ord + Debug,
    V: Clone + PartialEq + Debug,
{
    pub fn new(network_uid: U, quorum_size: usize) -> Self {
        Learner {
            network_uid,
            quorum_size,
            proposals: HashMap::new(),
            acceptors: HashMap::new(),
            final_value: None,
            final_proposal_id: None,
            final_acceptors: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.final_value.is_some()
    }

    pub fn final_value(&self) -> Option<&V> {
        self.final_value.as_ref()
    }

    pub fn final_acceptors(&self) -> Option<&HashSet<U>> {
        self.final_acceptors.as_ref()
    }

    /// Counts one `Accepted` message toward its proposal id. Once a proposal id has been
    /// Accepted by a quorum of distinct acceptors, emits a `Resolution` and discards the
    /// per-proposal bookkeeping. After resolution, every further `Accepted` (even for a
    /// now-discarded proposal) re-emits `Resolution` unconditionally, and any whose id/value
    /// match the resolved one extends `final_acceptors` so late learners can be told who has
    /// committed.
    pub fn receive_accepted(&mut self, msg: AcceptedMsg<U, V>) -> Option<Message<U, V>> {
        if self.is_resolved() {
            let final_proposal_id = self.final_proposal_id.as_ref().unwrap();
            let final_value = self.final_value.as_ref().unwrap();
            if &msg.proposal_id >= final_proposal_id && &msg.proposal_value == final_value {
                self.final_acceptors.as_mut().unwrap().insert(msg.from_uid);
            }
            return Some(Message::Resolution(ResolutionMsg {
                from_uid: self.network_uid.clone(),
                value: self.final_value.clone().unwrap(),
            }));
        }

        let last_pn = self.acceptors.get(&msg.from_uid).cloned();
        if let Some(last) = &last_pn {
            if msg.proposal_id <= *last {
                return None;
            }
        }
        self.acceptors.insert(msg.from_uid.clone(), msg.proposal_id.clone());

        if let Some(last) = last_pn {
            if let Some(ps) = self.proposals.get_mut(&last) {
                ps.retain_count -= 1;
                ps.acceptors.remove(&msg.from_uid);
                if ps.retain_count == 0 {
                    self.proposals.remove(&last);
                }
            }
        }

        let ps = self
            .proposals
            .entry(msg.proposal_id.clone())
            .or_insert_with(|| ProposalStatus::new(msg.proposal_value.clone()));

        assert_eq!(
            ps.value, msg.proposal_value,
            "value mismatch for single proposal id {:?}: protocol safety violation",
            msg.proposal_id
        );

        ps.accept_count += 1;
        ps.retain_count += 1;
        ps.acceptors.insert(msg.from_uid);

        if ps.accept_count == self.quorum_size {
            let final_acceptors = ps.acceptors.clone();
            self.final_proposal_id = Some(msg.proposal_id.clone());
            self.final_value = Some(msg.proposal_value.clone());
            self.final_acceptors = Some(final_acceptors);
            self.proposals.clear();
            self.acceptors.clear();

            debug!(
                "[{:?}] resolved {:?} = {:?}",
                self.network_uid, msg.proposal_id, msg.proposal_value
            );

            Some(Message::Resolution(ResolutionMsg {
                from_uid: self.network_uid.clone(),
                value: msg.proposal_value,
            }))
        } else {
            None
        }
    }

    /// Dispatches by message variant. Receiving a variant this role does not handle is a
    /// programming error, surfaced as [`PaxosError::InvalidMessage`] rather than silently dropped.
    pub fn receive(&mut self, msg: Message<U, V>) -> Result<Option<Message<U, V>>, PaxosError> {
        match msg {
            Message::Accepted(accepted) => Ok(self.receive_accepted(accepted)),
            other => Err(PaxosError::InvalidMessage {
                role: "Learner",
                variant: other.variant_name(),
            }),
        }
    }
}
