/// Convenience result type used across wordreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Malformed word payload or invalid configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or local-read failure while fetching the audio track.
    #[error("audio fetch error: {0}")]
    AudioFetch(String),

    /// Segment encode or concatenation failure reported by the external encoder.
    #[error("encode error: {0}")]
    Encode(String),

    /// Directory creation or frame write failure.
    #[error("filesystem error: {0}")]
    Filesystem(String),

    /// Errors while laying out or rasterizing the caption scene.
    #[error("render error: {0}")]
    Render(String),

    /// A bounded operation exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The job was cancelled between suspension points.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stable, serializable failure classification reported in job status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`ReelError::Validation`].
    InputValidation,
    /// See [`ReelError::AudioFetch`].
    AudioFetch,
    /// See [`ReelError::Encode`].
    Encode,
    /// See [`ReelError::Filesystem`].
    Filesystem,
    /// See [`ReelError::Render`].
    Render,
    /// See [`ReelError::Timeout`].
    Timeout,
    /// See [`ReelError::Cancelled`].
    Cancelled,
    /// Anything else.
    Internal,
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::AudioFetch`] value.
    pub fn audio_fetch(msg: impl Into<String>) -> Self {
        Self::AudioFetch(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Filesystem`] value.
    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::Filesystem(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build a [`ReelError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Classify this error for status reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::InputValidation,
            Self::AudioFetch(_) => FailureKind::AudioFetch,
            Self::Encode(_) => FailureKind::Encode,
            Self::Filesystem(_) => FailureKind::Filesystem,
            Self::Render(_) => FailureKind::Render,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::Other(_) => FailureKind::Internal,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
