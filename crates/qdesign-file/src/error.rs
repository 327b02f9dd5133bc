use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON design file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML design file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported design file extension {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("design file version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("unknown component class \"{class}\" for component \"{name}\"")]
    UnknownComponentClass { class: String, name: String },

    #[error(transparent)]
    Design(#[from] qdesign_core::Error),
}
