//! crates/stackit_core/src/votes.rs
//!
//! The vote ledger kept on every answer.
//!
//! A ledger holds two sets of voters, one per direction. The sets can only be
//! changed through [`VoteLedger::apply`], which keeps them disjoint: no user is
//! ever an upvoter and a downvoter of the same answer at the same time.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::domain::UserId;
use crate::error::ForumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl FromStr for VoteDirection {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            "" => Err(ForumError::Validation("Missing vote type".to_string())),
            other => Err(ForumError::Validation(format!(
                "vote type must be 'up' or 'down', got '{other}'"
            ))),
        }
    }
}

/// What a single call to [`VoteLedger::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The voter had no vote and now has one in the requested direction.
    Cast,
    /// The voter repeated their current vote, which removes it.
    Retracted,
    /// The voter moved from the opposite direction to the requested one.
    Switched,
}

/// Stored vote sets overlap, so the record cannot be trusted.
#[derive(Debug, thiserror::Error)]
#[error("user {0} is recorded as both upvoter and downvoter")]
pub struct OverlappingVotes(pub UserId);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    upvotes: BTreeSet<UserId>,
    downvotes: BTreeSet<UserId>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored sets, rejecting any voter present in both.
    pub fn from_parts(
        upvotes: impl IntoIterator<Item = UserId>,
        downvotes: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, OverlappingVotes> {
        let upvotes: BTreeSet<UserId> = upvotes.into_iter().collect();
        let downvotes: BTreeSet<UserId> = downvotes.into_iter().collect();
        if let Some(voter) = upvotes.intersection(&downvotes).next() {
            return Err(OverlappingVotes(*voter));
        }
        Ok(Self { upvotes, downvotes })
    }

    /// Toggles `voter`'s vote in `direction`.
    ///
    /// Repeating the current vote retracts it; voting the other way moves the
    /// voter from one set to the other in a single step.
    pub fn apply(&mut self, voter: UserId, direction: VoteDirection) -> VoteOutcome {
        let (same, opposite) = match direction {
            VoteDirection::Up => (&mut self.upvotes, &mut self.downvotes),
            VoteDirection::Down => (&mut self.downvotes, &mut self.upvotes),
        };

        if same.remove(&voter) {
            return VoteOutcome::Retracted;
        }
        same.insert(voter);
        if opposite.remove(&voter) {
            VoteOutcome::Switched
        } else {
            VoteOutcome::Cast
        }
    }

    pub fn upvotes(&self) -> &BTreeSet<UserId> {
        &self.upvotes
    }

    pub fn downvotes(&self) -> &BTreeSet<UserId> {
        &self.downvotes
    }

    pub fn vote_of(&self, user: UserId) -> Option<VoteDirection> {
        if self.upvotes.contains(&user) {
            Some(VoteDirection::Up)
        } else if self.downvotes.contains(&user) {
            Some(VoteDirection::Down)
        } else {
            None
        }
    }

    /// Upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.upvotes.len() as i64 - self.downvotes.len() as i64
    }
}
