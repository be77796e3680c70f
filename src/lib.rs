pub mod cli;
pub mod error;
pub mod handler;
pub mod health;
pub mod metadata;
pub mod requests;
pub mod server;
pub mod storage;
pub mod todos;
pub mod types;
