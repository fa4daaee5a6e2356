use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tailwind-cli-manager crate
#[derive(Debug, Error)]
pub enum TailwindCliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP request to '{url}' failed: {message}")]
    Http { url: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unsupported platform: no Tailwind CSS CLI release for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error(
        "Tailwind CSS CLI not found at '{}' and automatic download is disabled. \
         Download the CLI manually to that path or enable automatic downloads.",
        path.display()
    )]
    MissingBinary { path: PathBuf },

    #[error("Failed to download Tailwind CSS CLI from '{url}' to '{}': {message}", path.display())]
    DownloadFailed {
        url: String,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    ScaffoldWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}: {detail}")]
    CommandFailed { message: String, detail: String },
}

impl TailwindCliError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TailwindCliError>;
