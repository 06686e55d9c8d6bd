//! API layer - HTTP endpoints and extractors

pub mod docs;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod user;
pub mod webhook;

pub use middleware::{AdminToken, AnyToken, UserToken};
pub use router::create_router;
pub use state::AppState;
