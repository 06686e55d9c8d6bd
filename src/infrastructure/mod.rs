//! Infrastructure layer - External service implementations

pub mod auth;
pub mod logging;
pub mod scheduler;
pub mod storage;
pub mod user;
pub mod webhook;
