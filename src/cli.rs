// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfship")]
#[command(about = "Package, fingerprint, and upload Cloud Foundry application bits")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cfship.yml configuration file
    Init {
        /// Controller API endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the fingerprint of an artifact location
    Fingerprint {
        /// Local path, archive URL, or git URL with optional #ref
        location: String,
    },

    /// Check whether a location differs from a known fingerprint
    Diff {
        location: String,

        /// Previously recorded fingerprint (empty means unknown)
        #[arg(long, default_value = "")]
        known: String,
    },

    /// Write the uploadable zip for a location to a file
    Package {
        location: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Upload a location as an app's bits
    Upload {
        /// App GUID
        app: String,
        location: String,
    },

    /// Print the fingerprint of the bits the platform holds for an app
    RemoteFingerprint {
        /// App GUID
        app: String,
    },
}
