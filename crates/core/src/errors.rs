//! Error types for the synchronization core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type. Every variant is fatal for the current run; data-integrity
//! problems that only warrant a warning are modelled as
//! [`DataWarning`](crate::models::DataWarning) instead.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Writing the payload dump file failed.
    #[error("failed to write payload dump to '{path}': {source}")]
    Dump {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors from loading the employee identity mapping.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The mapping file could not be opened.
    #[error("identity mapping file error at '{path}': {detail}")]
    MappingFileError {
        path: String,
        detail: String,
    },

    /// The mapping file is not a valid semicolon-separated table.
    #[error("identity mapping parse error in '{path}': {detail}")]
    ParseError {
        path: String,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Source (OS2mo) errors
// ---------------------------------------------------------------------------

/// Errors from reading the OS2mo API.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP-level transport error (network, TLS, decoding).
    #[error("OS2mo HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("OS2mo API error (HTTP {status}) for {url}: {body}")]
    ApiError {
        status: u16,
        url: String,
        body: String,
    },

    /// The API token cannot be sent as an HTTP header.
    #[error("OS2mo API token is not a valid value for the {0} header")]
    InvalidToken(String),

    /// `/service/o/` returned no organisation.
    #[error("OS2mo returned no organisation")]
    NoOrganisation,

    /// A referenced object is not present in the source.
    #[error("{entity} not found in OS2mo: {uuid}")]
    NotFound {
        entity: String,
        uuid: String,
    },
}

// ---------------------------------------------------------------------------
// Transform errors
// ---------------------------------------------------------------------------

/// Inconsistencies in the source data that cannot be represented downstream.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A manager has no account in the configured directory system.
    #[error("employee {person_uuid} is manager of {org_unit_uuid}, but has no associated {system} user")]
    ManagerWithoutDirectoryAccount {
        person_uuid: String,
        org_unit_uuid: String,
        system: String,
    },

    /// A unit turned up twice while walking the tree, either through a cycle
    /// or because it is listed under more than one parent.
    #[error("org unit {0} reached twice in the hierarchy")]
    RepeatedOrgUnit(String),
}

// ---------------------------------------------------------------------------
// Sink (OS2rollekatalog) errors
// ---------------------------------------------------------------------------

/// Errors from delivering the payload to OS2rollekatalog.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("OS2rollekatalog HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The role catalog rejected the payload.
    #[error("OS2rollekatalog API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },
}
