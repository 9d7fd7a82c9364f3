//! Command line [`Args`].

use clap::Parser;

use crate::config::LogLevel;

/// Server of the farming land lease marketplace.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file.
    ///
    /// Missing file is not an error, as the whole configuration may be
    /// provided via `CONF.`-prefixed environment variables.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Log level overriding the configured one.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Applies pending database migrations and exits without serving.
    #[arg(long)]
    pub migrate_only: bool,
}

impl Args {
    /// Parses command line arguments of the current process.
    ///
    /// # Errors
    ///
    /// If the arguments don't match the expected ones.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
