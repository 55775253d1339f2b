//! PASS CLI Library
//!
//! Command-line access to a PASS repository through `pass-client`.
//!
//! - **Fetch**: one object by type and id (`pass get`)
//! - **Query**: a page, or every page, of a filtered collection (`pass select`)
//! - **Delete**: one object by type and id (`pass delete`)
//!
//! Objects are printed to stdout as JSON:API resource documents. Logs go to
//! stderr so output can be piped.

pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use pass_client::PassClient;
use pass_common::config::{PassConfig, DEFAULT_PASS_CORE_URL};

/// PASS - command-line client for the PASS repository
#[derive(Parser, Debug)]
#[command(name = "pass")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository base URL
    #[arg(long, env = "PASS_CORE_URL", default_value = DEFAULT_PASS_CORE_URL, global = true)]
    pub url: String,

    /// Basic-auth user
    #[arg(long, env = "PASS_CORE_USER", global = true)]
    pub user: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "PASS_CORE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "PASS_CLIENT_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    /// Connection settings from the global flags
    pub fn pass_config(&self) -> PassConfig {
        PassConfig {
            base_url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Client for the configured repository
    pub fn client(&self) -> Result<PassClient> {
        Ok(PassClient::new(&self.pass_config())?)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one object
    Get {
        /// JSON:API type, e.g. grant or repositoryCopy
        entity_type: String,

        /// Object id
        id: String,

        /// Relationships to embed, comma separated
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,
    },

    /// List objects of one type
    Select {
        /// JSON:API type, e.g. submission
        entity_type: String,

        /// RSQL filter, e.g. "submissionStatus==submitted"
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort expression, e.g. "-submittedDate"
        #[arg(short, long)]
        sort: Option<String>,

        /// Relationships to embed, comma separated
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        /// Index of the first object
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Page size
        #[arg(short, long, default_value_t = pass_client::DEFAULT_LIMIT)]
        limit: u64,

        /// Walk every page instead of printing one
        #[arg(short, long)]
        all: bool,
    },

    /// Delete one object
    Delete {
        /// JSON:API type
        entity_type: String,

        /// Object id
        id: String,
    },
}
