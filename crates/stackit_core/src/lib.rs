pub mod acceptance;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod validation;
pub mod votes;

pub use domain::{
    AcceptanceState, Answer, AnswerId, AnswerView, Caller, Identity, IdentityCredentials,
    Notification, NotificationFeed, NotificationId, NotificationKind, Question, QuestionId,
    QuestionView, Role, User, UserId,
};
pub use error::{ForumError, ForumResult};
pub use ports::{ForumStore, PortError, PortResult};
pub use service::{ForumService, ForumSettings};
pub use votes::{VoteDirection, VoteLedger, VoteOutcome};
