// ABOUTME: Command module aggregator for the cfship CLI.
// ABOUTME: Re-exports artifact and bits command handlers.

mod artifact;
mod bits;

pub use artifact::{diff, fingerprint, package};
pub use bits::{remote_fingerprint, upload};
