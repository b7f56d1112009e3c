//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// rpreg - Register resource provider manifests with a control plane
#[derive(Parser, Debug)]
#[command(name = "rpreg")]
#[command(author, version, about = "Register resource provider manifests with a control plane", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to <config dir>/rpreg/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Control plane endpoint
    #[arg(long, global = true, env = "RPREG_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Radius plane to register into
    #[arg(long, global = true, env = "RPREG_PLANE")]
    pub plane: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate a manifest without contacting the control plane
    Validate {
        /// Manifest file (YAML or JSON)
        file: PathBuf,
    },

    /// Register a manifest: the provider, its types, versions and location
    Register {
        /// Manifest file (YAML or JSON)
        file: PathBuf,

        /// Run against an in-memory control plane and report the calls
        #[arg(long)]
        dry_run: bool,
    },

    /// Register one resource type of a manifest into an existing provider
    ///
    /// The provider and its location must already exist. The type is merged
    /// into the location, keeping the types registered before it.
    RegisterType {
        /// Manifest file (YAML or JSON)
        file: PathBuf,

        /// Name of the resource type to register
        #[arg(value_name = "TYPE")]
        type_name: String,
    },

    /// Register every manifest in a directory, in file name order
    RegisterDir {
        /// Directory of manifest files
        dir: PathBuf,

        /// Run against an in-memory control plane and report the calls
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
