use thiserror::Error;

/// All errors that can occur in cardsift-core.
#[derive(Debug, Error)]
pub enum CardsiftError {
    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CardsiftError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::DeckNotFound(_) => ExitCode::NotFound,
            Self::ValidationError(_) | Self::ConfigError(_) => ExitCode::InvalidArgs,
            Self::Io(_) | Self::Json(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

/// Exit codes reported by the `cardsift` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
}

pub type Result<T> = std::result::Result<T, CardsiftError>;
