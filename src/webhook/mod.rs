// Webhook dispatcher (C11).

pub mod dispatcher;
pub mod models;

pub use dispatcher::WebhookDispatcher;
pub use models::{ValidationPayload, WebhookPayload};
