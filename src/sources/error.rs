use thiserror::Error;

/// Failure of a single upstream fetch. Scoped to one coin or dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Unsupported coin: {0}")]
    UnsupportedCoin(String),

    #[error("{0} not configured")]
    MissingCredential(&'static str),

    #[error("{provider}: {message}")]
    Upstream { provider: String, message: String },
}

impl SourceError {
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedCoin(_) => "unsupported_coin",
            Self::MissingCredential(_) => "missing_credential",
            Self::Upstream { .. } => "upstream_error",
        }
    }
}
