pub mod config;
pub mod dice;
pub mod dictionaries;
pub mod error;
pub mod generators;
pub mod handlers;
pub mod key_generator;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod server;

pub use config::Config;
pub use error::{RandomError, Result};
pub use server::{create_app, Server};
