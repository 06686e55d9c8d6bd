//! User domain

mod entity;

pub use entity::User;
