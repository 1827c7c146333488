use std::io;
use std::path::{Path, PathBuf};

/// Coarse classification of every failure the tool can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    NotLoggedIn,
    ExternalService,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("A profile named '{0}' already exists. Try 'update' instead.")]
    DuplicateName(String),

    #[error("No saved profile matches '{0}'.")]
    ProfileNotFound(String),

    #[error("There is no saved profile for access key '{0}'. Have you saved it?")]
    NoCredentialForAccessKey(String),

    #[error("Role index {index} is out of range, the profile has {len} role(s).")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No access keys are listed for IAM user '{0}'.")]
    NoAccessKeys(String),

    #[error(
        "AWS environment variables are set and would override the selected profile: {}. Please clear them and try again.",
        .0.join(", ")
    )]
    EnvironmentConflict(Vec<String>),

    #[error(
        "Too many access keys ({0}, {1}). Rotation needs a free access key slot, delete one of them first."
    )]
    TooManyAccessKeys(String, String),

    #[error("You're not logged in.")]
    NotLoggedIn,

    #[error("AWS {operation} failed: {message}")]
    ExternalService {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Corrupt record at {}: {source}", .path.display())]
    CorruptRecord {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Corrupt provider file at {}: {message}", .path.display())]
    CorruptProviderFile { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ProfileNotFound(_)
            | Error::NoCredentialForAccessKey(_)
            | Error::IndexOutOfRange { .. }
            | Error::NoAccessKeys(_) => ErrorKind::NotFound,
            Error::DuplicateName(_)
            | Error::EnvironmentConflict(_)
            | Error::TooManyAccessKeys(_, _) => ErrorKind::Conflict,
            Error::NotLoggedIn => ErrorKind::NotLoggedIn,
            Error::ExternalService { .. } => ErrorKind::ExternalService,
            Error::Io { .. } | Error::CorruptRecord { .. } | Error::CorruptProviderFile { .. } => {
                ErrorKind::Storage
            }
        }
    }

    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
        move |source| Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path) -> impl FnOnce(serde_json::Error) -> Error + '_ {
        move |source| Error::CorruptRecord {
            path: path.to_path_buf(),
            source,
        }
    }
}
