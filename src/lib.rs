pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod llm;
pub mod profile;
pub mod router;
pub mod server;
pub mod session;
pub mod speech;
