//! A module which contains the definition of the proposal identifier used throughout the
//! Paxos algorithm.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A totally ordered identifier for a Proposer's round.
///
/// Proposal ids are compared lexicographically: `number` first, `uid` as the tiebreaker. Given
/// that every node only ever originates proposals under its own `uid`, this yields a strict
/// total order across all proposals ever issued by any node, which is what lets the Acceptor
/// reject stale rounds with a plain comparison.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalID<U> {
    pub number: u64,
    pub uid: U,
}

impl<U> ProposalID<U> {
    pub fn new(number: u64, uid: U) -> Self {
        ProposalID { number, uid }
    }
}

impl<U: Ord> PartialOrd for ProposalID<U> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<U: Ord> Ord for ProposalID<U> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.uid.cmp(&other.uid))
    }
}

/// Compares two optional proposal ids under the rule "absent is strictly less than any present
/// id, two absent ids are equal". `Option<ProposalID<U>>`'s derived `Ord` already happens to
/// agree with this rule (`None < Some(_)`), but the comparison is spelled out explicitly here so
/// the rule is visible at each call site instead of implicit in `Option`'s ordering.
pub fn option_greater<U: Ord>(candidate: Option<&ProposalID<U>>, current: Option<&ProposalID<U>>) -> bool {
    match (candidate, current) {
        (Some(c), Some(cur)) => c > cur,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Compares a proposal id against an optional "promised so far" id under the rule "absent is
/// smaller than any present id". Used by the Acceptor to decide whether an incoming id is
/// eligible (`id >= promised_id`).
pub fn at_least<U: Ord>(id: &ProposalID<U>, floor: Option<&ProposalID<U>>) -> bool {
    match floor {
        Some(f) => id >= f,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_number_first() {
        let a = ProposalID::new(4, "C");
        let b = ProposalID::new(4, "B");
        let c = ProposalID::new(3, "Z");
        assert!(a > b);
        assert!(b > c);
        assert!(a > c);
    }

    #[test]
    fn equal_ids_are_equal() {
        assert_eq!(ProposalID::new(1, "A"), ProposalID::new(1, "A"));
    }

    #[test]
    fn option_greater_treats_absent_as_smallest() {
        let p = ProposalID::new(1, "A");
        assert!(option_greater(Some(&p), None));
        assert!(!option_greater(None, Some(&p)));
        assert!(!option_greater(None, None));
        assert!(!option_greater(Some(&p), Some(&p)));
    }

    #[test]
    fn at_least_treats_absent_floor_as_always_eligible() {
        let p = ProposalID::new(1, "A");
        assert!(at_least(&p, None));
        assert!(at_least(&p, Some(&p)));
        assert!(!at_least(&p, Some(&ProposalID::new(2, "A"))));
    }
}
