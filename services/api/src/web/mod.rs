pub mod answers;
pub mod auth;
pub mod extract;
pub mod middleware;
pub mod notifications;
pub mod protocol;
pub mod questions;
pub mod rest;
pub mod state;
pub mod users;

// Re-export what the binaries need to assemble the server.
pub use rest::{router, ApiDoc};
pub use state::AppState;
