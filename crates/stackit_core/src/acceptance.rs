//! crates/stackit_core/src/acceptance.rs
//!
//! The acceptance gate: the rule deciding who may fill a question's
//! accepted-answer slot, and with which answer.

use crate::domain::{Answer, Caller, Question};
use crate::error::{ForumError, ForumResult};

/// Checks that `requester` may mark `answer` as the accepted answer of `question`.
///
/// Only the question's author may accept. Ownership is checked before the
/// answer's question link so that other users learn nothing about it.
pub fn authorize_acceptance(
    question: &Question,
    answer: &Answer,
    requester: &Caller,
) -> ForumResult<()> {
    if requester.user_id != question.author_id {
        return Err(ForumError::AuthorizationDenied(
            "only the author of the question can accept an answer".to_string(),
        ));
    }
    if answer.question_id != question.id {
        return Err(ForumError::Conflict(format!(
            "answer {} belongs to question {}, not {}",
            answer.id, answer.question_id, question.id
        )));
    }
    Ok(())
}
