use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving policy or talking to git.
///
/// Policy violations are not errors; checkers return them as values. Anything
/// here aborts the check before matching happens.
#[derive(Debug, Error)]
pub enum SnagError {
    #[error("parsing {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("reading {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{} requires snag >= {required}, but this is snag {running}",
        path.display()
    )]
    VersionTooOld {
        path: PathBuf,
        required: String,
        running: String,
    },

    #[error("{}: invalid min_version {value:?}", path.display())]
    InvalidVersion { path: PathBuf, value: String },

    #[error("{command} failed")]
    Git {
        command: String,
        #[source]
        source: git2::Error,
    },

    #[error("not on a branch (detached HEAD?)")]
    NotOnBranch,
}

impl SnagError {
    /// Wraps a libgit2 failure with the operation that produced it.
    pub fn git(command: impl Into<String>, source: git2::Error) -> Self {
        SnagError::Git {
            command: command.into(),
            source,
        }
    }
}

pub type SnagResult<T> = std::result::Result<T, SnagError>;
