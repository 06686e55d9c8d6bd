//! Authentication infrastructure module
//!
//! Role-carrying bearer tokens signed with an HMAC secret.

mod jwt;

pub use jwt::{Claims, TokenConfig, TokenService, EXPIRY_CLAIM, ROLE_CLAIM};
