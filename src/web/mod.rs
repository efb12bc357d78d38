pub mod client_auth;
pub mod error;
pub mod handlers;
