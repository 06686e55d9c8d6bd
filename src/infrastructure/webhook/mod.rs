//! Webhook infrastructure: URL registration and daily delivery

mod dispatcher;
mod job;
mod service;

pub use dispatcher::{DispatchOutcome, WebhookDispatcher};
pub use job::CheckSubscriptionsJob;
pub use service::WebhookUrlService;
