pub mod analytics_dto;
pub mod response_dto;
pub mod webhook_dto;
