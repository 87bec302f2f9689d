use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::key_generator::KeyStrategy;

#[derive(Debug, Clone, Parser, Validate)]
#[command(name = "randomizer")]
#[command(about = "HTTP API for random numbers, words, dice rolls and identifiers")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Requests allowed per client per window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 180)]
    #[validate(range(min = 1, message = "rate limit must allow at least one request"))]
    pub rate_limit_max: u64,

    /// Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    #[validate(range(min = 1, message = "rate limit window must be at least one second"))]
    pub rate_limit_window_secs: u64,

    /// How often idle rate limit windows are evicted, in seconds
    #[arg(long, env = "CLEANUP_INTERVAL_SECS", default_value_t = 300)]
    #[validate(range(min = 1, message = "cleanup interval must be at least one second"))]
    pub cleanup_interval_secs: u64,

    /// How clients are identified for rate limiting
    #[arg(long, env = "KEY_STRATEGY", value_enum, default_value_t = KeyStrategy::ForwardedFor)]
    pub key_strategy: KeyStrategy,

    /// Directory holding the bundled front-end
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Cache-Control max-age for static assets, in seconds
    #[arg(long, env = "STATIC_MAX_AGE_SECS", default_value_t = 60)]
    pub static_max_age_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rate_limit_max: 180,
            rate_limit_window_secs: 60,
            cleanup_interval_secs: 300,
            key_strategy: KeyStrategy::ForwardedFor,
            static_dir: PathBuf::from("static"),
            static_max_age_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from the command line and environment
    pub fn load() -> Result<Self, crate::error::RandomError> {
        let config = Config::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Directory the front-end is served from.
    ///
    /// A relative `static_dir` that does not exist under the working
    /// directory is looked up next to the executable instead.
    pub fn static_root(&self) -> PathBuf {
        if self.static_dir.is_absolute() || self.static_dir.is_dir() {
            return self.static_dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&self.static_dir)))
            .filter(|candidate| candidate.is_dir())
            .unwrap_or_else(|| self.static_dir.clone())
    }
}
