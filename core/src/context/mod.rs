mod config;
mod error;
mod libraries;

pub use config::AppConfig;
pub use error::{ConfigError, LibraryError};
pub use libraries::Libraries;
