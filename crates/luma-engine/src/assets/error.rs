use thiserror::Error;

/// Why a single asset file failed to load or reload.
///
/// Registry operations log these and carry on; they never abort a folder
/// walk or reach script code.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("file \"{0}\" not found")]
    NotFound(String),

    #[error("unsupported asset type for \"{0}\"")]
    UnsupportedExtension(String),

    #[error("cannot decode image \"{0}\"")]
    Decode(String),

    #[error("malformed description: {0}")]
    Description(#[from] serde_json::Error),

    #[error("invalid description \"{path}\": {reason}")]
    InvalidDescription { path: String, reason: String },

    #[error("GPU rejected {0}")]
    Gpu(String),

    #[error("asset \"{0}\" is already loaded")]
    Duplicate(String),

    #[error("cannot reload \"{0}\": no persistent source")]
    Reload(String),
}

impl AssetError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDescription {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
