//! Webhook domain module for the daily outbound notification

mod entity;

pub use entity::*;
