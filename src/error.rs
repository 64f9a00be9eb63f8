//! Error types for basenet.
//!
//! Each layer has its own error enum ([`SettingsError`], [`GraphError`]);
//! this module folds them into one [`Error`] so callers can match on the
//! exact point a run failed.

use thiserror::Error;

use crate::graph::GraphError;
use crate::settings::SettingsError;

/// Result type alias for basenet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for basenet.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Settings Errors
    // ========================================================================
    /// Settings could not be resolved.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    // ========================================================================
    // Resource Graph Errors
    // ========================================================================
    /// Building or deploying the resource graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl Error {
    /// Returns true if a configured value had the wrong shape.
    pub fn is_config_shape(&self) -> bool {
        matches!(self, Error::Settings(SettingsError::ConfigShape { .. }))
    }

    /// Returns true if a list was shorter than the number of zones.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Error::Settings(SettingsError::IndexOutOfRange { .. }))
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Settings(SettingsError::ConfigShape { .. }) => 4,
            Error::Settings(SettingsError::IndexOutOfRange { .. }) => 4,
            Error::Settings(SettingsError::Discovery { .. }) => 3,
            Error::Graph(GraphError::ResourceCreation { .. }) => 2,
            Error::Graph(_) => 1,
        }
    }
}
