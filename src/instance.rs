//! The composite instance: a node that plays all three roles at once. Built by composition
//! rather than inheritance: an aggregate struct owning one of each role, with its own dispatcher
//! forwarding to the right member and piggybacking `observe_proposal` the way a co-located
//! Acceptor/Learner is expected to.

use std::fmt::Debug;
use std::hash::Hash;

use crate::acceptor::Acceptor;
use crate::error::PaxosError;
use crate::learner::Learner;
use crate::message::Message;
use crate::proposal_id::ProposalID;
use crate::proposer::Proposer;

/// A node running all three Paxos roles. The piggybacked `observe_proposal` call lets this
/// node's Proposer pre-emptively raise its own round counter whenever its local Acceptor sees a
/// higher proposal, so the next `prepare()` is not wasted on a round already known to be stale.
pub struct PaxosInstance<U, V> {
    pub proposer: Proposer<U, V>,
    pub acceptor: Acceptor<U, V>,
    pub learner: Learner<U, V>,
}

impl<U, V> PaxosInstance<U, V>
where
    U: Clone + Eq + Hash + Ord + Debug,
    V: Clone + PartialEq + Debug,
{
    pub fn new(
        network_uid: U,
        quorum_size: usize,
        promised_id: Option<ProposalID<U>>,
        accepted_id: Option<ProposalID<U>>,
        accepted_value: Option<V>,
    ) -> Self {
        PaxosInstance {
            proposer: Proposer::new(network_uid.clone(), quorum_size),
            acceptor: Acceptor::new(network_uid.clone(), promised_id, accepted_id, accepted_value),
            learner: Learner::new(network_uid, quorum_size),
        }
    }

    /// Dispatches a message to whichever role handles it: `Prepare`/`Accept` go to the Acceptor
    /// (after piggybacking `observe_proposal` on the Proposer), `Promise`/`Nack` go to the
    /// Proposer, `Accepted` goes to the Learner. No other variant reaches this instance without
    /// error.
    pub fn receive(&mut self, msg: Message<U, V>) -> Result<Option<Message<U, V>>, PaxosError> {
        match msg {
            Message::Prepare(prepare) => {
                self.proposer.observe_proposal(&prepare.proposal_id);
                Ok(Some(self.acceptor.receive_prepare(prepare)))
            }
            Message::Accept(accept) => {
                self.proposer.observe_proposal(&accept.proposal_id);
                Ok(Some(self.acceptor.receive_accept(accept)))
            }
            Message::Promise(promise) => Ok(self.proposer.receive_promise(promise)),
            Message::Nack(nack) => Ok(self.proposer.receive_nack(nack)),
            Message::Accepted(accepted) => Ok(self.learner.receive_accepted(accepted)),
            Message::Resolution(_) => Err(PaxosError::InvalidMessage {
                role: "PaxosInstance",
                variant: msg.variant_name(),
            }),
        }
    }
}
