//! tappweb
//!
//! Small web service: user creation, a single registered webhook URL notified
//! daily by an in-process scheduler, and a generic query repository over
//! PostgreSQL.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use context::AppContext;
