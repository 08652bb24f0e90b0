pub mod analytics;
pub mod health;
pub mod responses;
pub mod webhooks;
