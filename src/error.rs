use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {seconds:.1} seconds")]
    Timeout { seconds: f64 },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a test or download could not be started.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("an operation of this kind is already running")]
    Busy,

    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("Please choose a download folder")]
    EmptyDownloadPath,

    #[error("Cannot create download directory: {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no home directory to store settings in")]
    NoHomeDirectory,
}
