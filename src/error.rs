//! Error types for nestrun

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NestError {
    #[error("No descriptor found in {container}")]
    ConfigurationMissing { container: String },

    #[error("Malformed descriptor (line {line}): {message}")]
    DescriptorMalformed { line: usize, message: String },

    #[error("Could not open stream for URI '{uri}'")]
    ReferenceNotFound { uri: String },

    #[error("Malformed reference '{uri}': {reason}")]
    MalformedReference { uri: String, reason: String },

    #[error("Scheme '{scheme}' is already registered")]
    RegistrationConflict { scheme: String },

    #[error("No handler registered for scheme '{scheme}'")]
    UnknownScheme { scheme: String },

    #[error("Descriptor does not declare an entry point")]
    EntryPointUndeclared,

    #[error("Entry point not found: {name}")]
    EntryPointNotFound { name: String },

    #[error("Unit {name} is malformed: {reason}")]
    UnitMalformed { name: String, reason: String },

    #[error("Entry point {name} exited with status {status}")]
    EntryPointFailed { name: String, status: i32 },

    #[error("Invalid container {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NestError>;
