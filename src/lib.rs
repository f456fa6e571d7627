// ABOUTME: Library root for cfship - artifact acquisition, bits transfer, and app deployment.
// ABOUTME: The developer CLI binary is in main.rs.

pub mod artifact;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod poll;
pub mod types;
