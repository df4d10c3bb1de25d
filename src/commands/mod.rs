//! Caller-facing operations. Each returns `Result<_, String>` so front ends
//! can show the message directly.

pub mod analysis;
pub mod config;
pub mod health;
pub mod history;
pub mod keychain;
