//! The Acceptor role: the fault-tolerant memory of Paxos. An Acceptor's entire durable state is
//! three fields (`promised_id`, `accepted_id`, `accepted_value`) which an embedder must persist
//! before the corresponding reply becomes observable to any other participant. The core specifies
//! *when* that persistence must happen (see the doc comments on [`Acceptor::receive_prepare`] and
//! [`Acceptor::receive_accept`]), not *how*; it performs no I/O itself.

use std::fmt::Debug;

use log::trace;

use crate::error::PaxosError;
use crate::message::{AcceptMsg, AcceptedMsg, Message, NackMsg, PrepareMsg, PromiseMsg};
use crate::proposal_id::{at_least, ProposalID};

/// Holds the three durably-persisted fields of a single Acceptor. Equality is accepted (not just
/// strict greater) when comparing an incoming proposal id against `promised_id`, so a retried
/// Prepare from the currently-promised proposer still yields a fresh Promise.
pub struct Acceptor<U, V> {
    network_uid: U,
    promised_id: Option<ProposalID<U>>,
    accepted_id: Option<ProposalID<U>>,
    accepted_value: Option<V>,
}

impl<U, V> Acceptor<U, V>
where
    U: Clone + Ord + Debug,
    V: Clone + Debug,
{
    /// Constructs an Acceptor, rehydrating from persisted state if the three optionals are
    /// supplied together (all absent for a brand-new Acceptor).
    pub fn new(
        network_uid: U,
        promised_id: Option<ProposalID<U>>,
        accepted_id: Option<ProposalID<U>>,
        accepted_value: Option<V>,
    ) -> Self {
        Acceptor {
            network_uid,
            promised_id,
            accepted_id,
            accepted_value,
        }
    }

    /// A brand-new Acceptor with no prior persisted state.
    pub fn fresh(network_uid: U) -> Self {
        Acceptor::new(network_uid, None, None, None)
    }

    pub fn promised_id(&self) -> Option<&ProposalID<U>> {
        self.promised_id.as_ref()
    }

    pub fn accepted_id(&self) -> Option<&ProposalID<U>> {
        self.accepted_id.as_ref()
    }

    pub fn accepted_value(&self) -> Option<&V> {
        self.accepted_value.as_ref()
    }

    /// The three fields that must be written to stable storage before this Acceptor's reply is
    /// handed to the transport. An embedder calls this after `receive_prepare`/`receive_accept`
    /// return and persists the triple before sending the returned message.
    pub fn persisted_state(&self) -> (Option<ProposalID<U>>, Option<ProposalID<U>>, Option<V>) {
        (
            self.promised_id.clone(),
            self.accepted_id.clone(),
            self.accepted_value.clone(),
        )
    }

    /// Returns a `Promise` if `msg.proposal_id >= promised_id` (absent `promised_id` counts as
    /// smaller than any id), otherwise a `Nack`. The caller must persist `persisted_state()`
    /// before transmitting the returned message to any other participant. Once `promised_id`
    /// has advanced, this Acceptor must never again emit a Promise or Accepted below it.
    pub fn receive_prepare(&mut self, msg: PrepareMsg<U>) -> Message<U, V> {
        if at_least(&msg.proposal_id, self.promised_id.as_ref()) {
            self.promised_id = Some(msg.proposal_id.clone());
            debug_assert!(match (&self.accepted_id, &self.promised_id) {
                (Some(a), Some(p)) => a <= p,
                (Some(_), None) => false,
                (None, _) => true,
            });

            trace!("[{:?}] promised {:?}", self.network_uid, msg.proposal_id);

            Message::Promise(PromiseMsg {
                from_uid: self.network_uid.clone(),
                proposer_uid: msg.from_uid,
                proposal_id: self.promised_id.clone().unwrap(),
                last_accepted_id: self.accepted_id.clone(),
                last_accepted_value: self.accepted_value.clone(),
            })
        } else {
            Message::Nack(NackMsg {
                from_uid: self.network_uid.clone(),
                proposer_uid: msg.from_uid,
                proposal_id: msg.proposal_id,
                promised_proposal_id: self.promised_id.clone().unwrap(),
            })
        }
    }

    /// Returns an `Accepted` if `msg.proposal_id >= promised_id`, otherwise a `Nack`. Accepting at
    /// equality (not only strict greater) is required for the leader to commit after its own
    /// Prepare landed at the same id. As with `receive_prepare`, the caller must persist
    /// `persisted_state()` before transmitting the returned message.
    pub fn receive_accept(&mut self, msg: AcceptMsg<U, V>) -> Message<U, V> {
        if at_least(&msg.proposal_id, self.promised_id.as_ref()) {
            self.promised_id = Some(msg.proposal_id.clone());
            self.accepted_id = Some(msg.proposal_id.clone());
            self.accepted_value = Some(msg.proposal_value.clone());

            trace!("[{:?}] accepted {:?}", self.network_uid, msg.proposal_id);

            Message::Accepted(AcceptedMsg {
                from_uid: self.network_uid.clone(),
                proposal_id: msg.proposal_id,
                proposal_value: msg.proposal_value,
            })
        } else {
            Message::Nack(NackMsg {
                from_uid: self.network_uid.clone(),
                proposer_uid: msg.from_uid,
                proposal_id: msg.proposal_id,
                promised_proposal_id: self.promised_id.clone().unwrap(),
            })
        }
    }

    /// Dispatches by message variant. Receiving a variant this role does not handle is a
    /// programming error, surfaced as [`PaxosError::InvalidMessage`] rather than silently dropped.
    pub fn receive(&mut self, msg: Message<U, V>) -> Result<Message<U, V>, PaxosError> {
        match msg {
            Message::Prepare(prepare) => Ok(self.receive_prepare(prepare)),
            Message::Accept(accept) => Ok(self.receive_accept(accept)),
            other => Err(PaxosError::InvalidMessage {
                role: "Acceptor",
                variant: other.variant_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_acceptor_promises_any_prepare() {
        let mut a: Acceptor<String, String> = Acceptor::fresh("X".to_string());
        let pid = ProposalID::new(1, "A".to_string());
        let reply = a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: pid.clone(),
        });
        match reply {
            Message::Promise(p) => {
                assert_eq!(p.proposal_id, pid);
                assert!(p.last_accepted_id.is_none());
                assert!(p.last_accepted_value.is_none());
            }
            _ => panic!("expected Promise"),
        }
    }

    #[test]
    fn prepare_rejected_below_promised() {
        let mut a: Acceptor<String, String> = Acceptor::new(
            "X".to_string(),
            Some(ProposalID::new(5, "Z".to_string())),
            None,
            None,
        );
        let reply = a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: ProposalID::new(3, "A".to_string()),
        });
        match reply {
            Message::Nack(n) => {
                assert_eq!(n.promised_proposal_id, ProposalID::new(5, "Z".to_string()));
                assert_eq!(n.proposal_id, ProposalID::new(3, "A".to_string()));
            }
            _ => panic!("expected Nack"),
        }
    }

    #[test]
    fn retried_prepare_at_same_id_still_promises() {
        let mut a: Acceptor<String, String> = Acceptor::fresh("X".to_string());
        let pid = ProposalID::new(1, "A".to_string());
        a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: pid.clone(),
        });
        let second = a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: pid.clone(),
        });
        assert!(matches!(second, Message::Promise(_)));
    }

    #[test]
    fn accept_at_promised_id_succeeds() {
        let mut a: Acceptor<String, String> = Acceptor::fresh("X".to_string());
        let pid = ProposalID::new(1, "A".to_string());
        a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: pid.clone(),
        });
        let reply = a.receive_accept(AcceptMsg {
            from_uid: "A".to_string(),
            proposal_id: pid.clone(),
            proposal_value: "v1".to_string(),
        });
        match reply {
            Message::Accepted(acc) => {
                assert_eq!(acc.proposal_id, pid);
                assert_eq!(acc.proposal_value, "v1");
            }
            _ => panic!("expected Accepted"),
        }
        assert_eq!(a.accepted_value(), Some(&"v1".to_string()));
    }

    #[test]
    fn promised_id_is_monotone_non_decreasing() {
        let mut a: Acceptor<String, String> = Acceptor::fresh("X".to_string());
        a.receive_prepare(PrepareMsg {
            from_uid: "A".to_string(),
            proposal_id: ProposalID::new(3, "A".to_string()),
        });
        a.receive_prepare(PrepareMsg {
            from_uid: "B".to_string(),
            proposal_id: ProposalID::new(1, "B".to_string()),
        });
        assert_eq!(a.promised_id(), Some(&ProposalID::new(3, "A".to_string())));
    }

    #[test]
    fn receive_rejects_unsupported_variant() {
        let mut a: Acceptor<String, String> = Acceptor::fresh("X".to_string());
        let err = a
            .receive(Message::Resolution(crate::message::ResolutionMsg {
                from_uid: "A".to_string(),
                value: "v".to_string(),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            PaxosError::InvalidMessage {
                role: "Acceptor",
                variant: "Resolution"
            }
        );
    }
}
