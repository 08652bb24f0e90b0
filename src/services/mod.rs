pub mod analytics_service;
pub mod delivery_service;
pub mod form_service;
pub mod webhook_service;
pub mod webhook_store;
