//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::ProfilerConfig;
use crate::domain::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "sqltrail-demo",
    about = "Demo service traced by sqltrail, with the inspector alongside",
    after_help = "\
EXAMPLES:
    sqltrail-demo                                  Service on :9000, inspector on :8000
    sqltrail-demo --config profiler.json           Load settings from a JSON file
    sqltrail-demo --capacity 10 --raw              Keep 10 scopes, serve JSON only
    curl http://127.0.0.1:9000/users               Generate a traced request"
)]
pub struct Args {
    /// Address of the demo service
    #[arg(long, default_value = "127.0.0.1:9000", value_name = "ADDR")]
    pub listen: String,

    /// Address of the inspector
    #[arg(long, default_value = "127.0.0.1:8000", value_name = "ADDR")]
    pub inspect: String,

    /// JSON profiler config (flags below override it)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scopes retained (negative = unlimited)
    #[arg(long, allow_negative_numbers = true)]
    pub capacity: Option<i64>,

    /// Stack frames skipped when naming an operation's caller
    #[arg(long, value_name = "N")]
    pub skip_frames: Option<usize>,

    /// Serve only the raw JSON document
    #[arg(long)]
    pub raw: bool,

    /// Start with tracking disabled
    #[arg(long)]
    pub disabled: bool,
}

impl Args {
    /// Build the profiler config: defaults, then the config file, then flags.
    ///
    /// # Errors
    /// Propagates config file read, parse and validation failures.
    pub fn profiler_config(&self) -> Result<ProfilerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProfilerConfig::from_file(path)?,
            None => ProfilerConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(skip) = self.skip_frames {
            config.skip_frames = skip;
        }
        if self.disabled {
            config.enabled = false;
        }

        Ok(config)
    }
}
