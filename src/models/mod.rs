pub mod field;
pub mod form;
pub mod response;
pub mod webhook;
pub mod webhook_log;
