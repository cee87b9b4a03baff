pub mod admin;
pub mod chat;
pub mod header;
pub mod login;
pub mod projects;
pub mod toast;
