//! The Proposer role: drives the Prepare/Accept rounds and tracks Promises and NACKs for the
//! current round. See the module-level documentation in `lib.rs` for how a Proposer is expected
//! to be embedded.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, trace};

use crate::error::PaxosError;
use crate::message::{AcceptMsg, Message, NackMsg, PrepareMsg, PromiseMsg};
use crate::proposal_id::{option_greater, ProposalID};

/// Drives the Prepare/Accept protocol for a single Paxos instance, tracking the state of the
/// current round. A `Proposer` may be asked to propose a new round at any time by calling
/// [`Proposer::prepare`] again; there is no terminal state.
pub struct Proposer<U, V> {
    network_uid: U,
    quorum_size: usize,

    leader: bool,
    proposed_value: Option<V>,
    proposal_id: ProposalID<U>,
    highest_proposal_id: ProposalID<U>,
    highest_accepted_id: Option<ProposalID<U>>,

    promises_received: Option<HashSet<U>>,
    nacks_received: Option<HashSet<U>>,

    current_prepare_msg: Option<Message<U, V>>,
    current_accept_msg: Option<Message<U, V>>,
}

impl<U, V> Proposer<U, V>
where
    U: Clone + Eq + Hash + Ord + Debug,
    V: Clone + PartialEq + Debug,
{
    pub fn new(network_uid: U, quorum_size: usize) -> Self {
        let proposal_id = ProposalID::new(0, network_uid.clone());
        Proposer {
            network_uid,
            quorum_size,
            leader: false,
            proposed_value: None,
            proposal_id: proposal_id.clone(),
            highest_proposal_id: proposal_id,
            highest_accepted_id: None,
            promises_received: None,
            nacks_received: None,
            current_prepare_msg: None,
            current_accept_msg: None,
        }
    }

    pub fn leader(&self) -> bool {
        self.leader
    }

    pub fn proposal_id(&self) -> &ProposalID<U> {
        &self.proposal_id
    }

    pub fn proposed_value(&self) -> Option<&V> {
        self.proposed_value.as_ref()
    }

    /// Sets the value this node wants agreement on, unless a value has already entered the
    /// round. Once any value has entered the round it must never be changed: a later Promise may
    /// deliver a higher `last_accepted_value` that this Proposer is obligated to carry forward
    /// instead (see [`Proposer::receive_promise`]).
    pub fn propose_value(&mut self, value: V) -> Option<Message<U, V>> {
        if self.proposed_value.is_some() {
            return None;
        }
        self.proposed_value = Some(value.clone());

        if self.leader {
            let m = Message::Accept(AcceptMsg {
                from_uid: self.network_uid.clone(),
                proposal_id: self.proposal_id.clone(),
                proposal_value: value,
            });
            self.current_accept_msg = Some(m.clone());
            Some(m)
        } else {
            None
        }
    }

    /// Begins a new round: clears `leader` and the per-round receive sets, advances
    /// `proposal_id` to one higher than the highest id ever observed, and returns a fresh
    /// `Prepare` to broadcast. Successive calls produce strictly increasing proposal ids under
    /// this node's uid.
    pub fn prepare(&mut self) -> Message<U, V> {
        self.leader = false;
        self.promises_received = Some(HashSet::new());
        self.nacks_received = Some(HashSet::new());
        self.highest_accepted_id = None;

        self.proposal_id = ProposalID::new(self.highest_proposal_id.number + 1, self.network_uid.clone());
        self.highest_proposal_id = self.proposal_id.clone();

        debug!(
            "[{:?}] starting round {:?}",
            self.network_uid, self.proposal_id
        );

        let m = Message::Prepare(PrepareMsg {
            from_uid: self.network_uid.clone(),
            proposal_id: self.proposal_id.clone(),
        });
        self.current_prepare_msg = Some(m.clone());
        m
    }

    /// Raises `highest_proposal_id` if `pid` is higher, pre-empting a doomed round before a
    /// Nack even arrives. Called automatically on every Promise and Nack; may also be called
    /// by a co-located Acceptor/Learner on any message it sees.
    pub fn observe_proposal(&mut self, pid: &ProposalID<U>) {
        if *pid > self.highest_proposal_id {
            self.highest_proposal_id = pid.clone();
        }
    }

    /// A quorum of NACKs proves the current round cannot succeed; jumping straight to a new
    /// `prepare()` is a liveness optimization. NACKs arriving before this Proposer's first
    /// `prepare()` call are ignored (but still observed), matching the reference semantics.
    pub fn receive_nack(&mut self, msg: NackMsg<U>) -> Option<Message<U, V>> {
        self.observe_proposal(&msg.promised_proposal_id);

        if msg.proposal_id != self.proposal_id {
            return None;
        }

        let quorum_reached = if let Some(nacks) = &mut self.nacks_received {
            nacks.insert(msg.from_uid);
            nacks.len() == self.quorum_size
        } else {
            false
        };

        if quorum_reached {
            debug!("[{:?}] quorum of nacks, restarting round", self.network_uid);
            Some(self.prepare())
        } else {
            None
        }
    }

    /// Records a Promise for the current round. Duplicate Promises from the same acceptor are
    /// ignored (idempotence). Adopts the value of the highest prior acceptance observed so far
    /// (the Paxos safety rule), and becomes leader once a quorum of Promises has been received.
    pub fn receive_promise(&mut self, msg: PromiseMsg<U, V>) -> Option<Message<U, V>> {
        self.observe_proposal(&msg.proposal_id);

        if self.leader || msg.proposal_id != self.proposal_id {
            return None;
        }

        let already_counted = self
            .promises_received
            .as_ref()
            .map(|r| r.contains(&msg.from_uid))
            .unwrap_or(true);
        if already_counted {
            return None;
        }

        let quorum_size = self.quorum_size;
        let quorum_reached = if let Some(received) = &mut self.promises_received {
            received.insert(msg.from_uid.clone());
            trace!(
                "[{:?}] promise from {:?} ({}/{})",
                self.network_uid,
                msg.from_uid,
                received.len(),
                quorum_size
            );
            received.len() == quorum_size
        } else {
            false
        };

        if option_greater(msg.last_accepted_id.as_ref(), self.highest_accepted_id.as_ref()) {
            self.highest_accepted_id = msg.last_accepted_id;
            if let Some(v) = msg.last_accepted_value {
                self.proposed_value = Some(v);
            }
        }

        if quorum_reached {
            self.leader = true;
            debug!("[{:?}] quorum of promises, became leader", self.network_uid);

            self.proposed_value.clone().map(|value| {
                let m = Message::Accept(AcceptMsg {
                    from_uid: self.network_uid.clone(),
                    proposal_id: self.proposal_id.clone(),
                    proposal_value: value,
                });
                self.current_accept_msg = Some(m.clone());
                m
            })
        } else {
            None
        }
    }

    /// Dispatches by message variant. Receiving a variant this role does not handle is a
    /// programming error, surfaced as [`PaxosError::InvalidMessage`] rather than silently dropped.
    pub fn receive(&mut self, msg: Message<U, V>) -> Result<Option<Message<U, V>>, PaxosError> {
        match msg {
            Message::Promise(promise) => Ok(self.receive_promise(promise)),
            Message::Nack(nack) => Ok(self.receive_nack(nack)),
            other => Err(PaxosError::InvalidMessage {
                role: "Proposer",
                variant: other.variant_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PromiseMsg;

    fn nack(proposer_uid: &str, proposal_id: ProposalID<String>, promised: ProposalID<String>, from: &str) -> NackMsg<String> {
        NackMsg {
            from_uid: from.to_string(),
            proposer_uid: proposer_uid.to_string(),
            proposal_id,
            promised_proposal_id: promised,
        }
    }

    fn promise(
        proposer_uid: &str,
        from: &str,
        proposal_id: ProposalID<String>,
        last_accepted_id: Option<ProposalID<String>>,
        last_accepted_value: Option<String>,
    ) -> PromiseMsg<String, String> {
        PromiseMsg {
            from_uid: from.to_string(),
            proposer_uid: proposer_uid.to_string(),
            proposal_id,
            last_accepted_id,
            last_accepted_value,
        }
    }

    #[test]
    fn prepare_produces_strictly_increasing_ids() {
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        let m1 = p.prepare();
        let m2 = p.prepare();

        let id1 = match m1 {
            Message::Prepare(p) => p.proposal_id,
            _ => panic!("expected Prepare"),
        };
        let id2 = match m2 {
            Message::Prepare(p) => p.proposal_id,
            _ => panic!("expected Prepare"),
        };
        assert!(id2.number > id1.number);
    }

    #[test]
    fn solo_round_quorum_two() {
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        p.prepare();

        assert!(p
            .receive_promise(promise("A", "X", p.proposal_id.clone(), None, None))
            .is_none());
        let accept = p.receive_promise(promise("A", "Y", p.proposal_id.clone(), None, None));
        assert!(accept.is_none(), "no value proposed yet");
        assert!(p.leader());

        let accept = p.propose_value("v1".to_string());
        match accept {
            Some(Message::Accept(a)) => {
                assert_eq!(a.proposal_value, "v1");
                assert_eq!(a.proposal_id, p.proposal_id);
            }
            _ => panic!("expected an Accept once leader with a value"),
        }
    }

    #[test]
    fn promise_carries_prior_value_forward() {
        let mut p: Proposer<String, String> = Proposer::new("B".to_string(), 2);
        p.prepare();
        let pid = p.proposal_id.clone();

        p.receive_promise(promise(
            "B",
            "X",
            pid.clone(),
            Some(ProposalID::new(1, "A".to_string())),
            Some("v1".to_string()),
        ));
        let accept = p.receive_promise(promise("B", "Y", pid.clone(), None, None));

        match accept {
            Some(Message::Accept(a)) => assert_eq!(a.proposal_value, "v1"),
            _ => panic!("expected Accept carrying v1, not B's own value"),
        }
    }

    #[test]
    fn quorum_of_nacks_restarts_round() {
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        p.prepare();
        let pid = p.proposal_id.clone();
        let higher = ProposalID::new(5, "Z".to_string());

        assert!(p.receive_nack(nack("A", pid.clone(), higher.clone(), "X")).is_none());
        let restart = p.receive_nack(nack("A", pid, higher, "Y"));
        match restart {
            Some(Message::Prepare(prep)) => assert!(prep.proposal_id.number >= 6),
            _ => panic!("expected a new Prepare after quorum of nacks"),
        }
    }

    #[test]
    fn duplicate_promise_is_idempotent() {
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        p.prepare();
        let pid = p.proposal_id.clone();
        let msg = promise("A", "X", pid, None, None);

        p.receive_promise(msg.clone());
        let count_after_first = p.promises_received.as_ref().unwrap().len();
        let second = p.receive_promise(msg);
        assert!(second.is_none());
        assert_eq!(p.promises_received.as_ref().unwrap().len(), count_after_first);
    }

    #[test]
    fn nack_before_any_prepare_is_ignored_but_observed() {
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        let higher = ProposalID::new(9, "Z".to_string());
        let result = p.receive_nack(nack("A", ProposalID::new(0, "A".to_string()), higher.clone(), "X"));
        assert!(result.is_none());
        assert_eq!(p.highest_proposal_id, higher);
    }

    #[test]
    fn receive_rejects_unsupported_variant() {
        use crate::message::PrepareMsg;
        let mut p: Proposer<String, String> = Proposer::new("A".to_string(), 2);
        let err = p
            .receive(Message::Prepare(PrepareMsg {
                from_uid: "Z".to_string(),
                proposal_id: ProposalID::new(1, "Z".to_string()),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            PaxosError::InvalidMessage {
                role: "Proposer",
                variant: "Prepare"
            }
        );
    }
}
