pub mod admin_service;
pub mod chat_service;
