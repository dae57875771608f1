//! Error types for context operations

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::timeline::TimelineError;

/// Errors while assembling the ability catalog and encounter library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Encounter(#[from] TimelineError),
}

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}
