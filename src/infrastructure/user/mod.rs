//! User infrastructure

mod service;

pub use service::UserService;
