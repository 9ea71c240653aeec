use crate::store::StorageError;

pub type LabelResult<T> = Result<T, LabelError>;

#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error("fetch error for '{key}': {source}")]
    Fetch {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("store error for '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("format mismatch: key says {extension}, content is {sniffed}")]
    FormatMismatch {
        extension: &'static str,
        sniffed: &'static str,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("cancelled before processing started")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LabelError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fetch(key: impl Into<String>, source: StorageError) -> Self {
        Self::Fetch {
            key: key.into(),
            source,
        }
    }

    pub fn store(key: impl Into<String>, source: StorageError) -> Self {
        Self::Store {
            key: key.into(),
            source,
        }
    }

    /// Short stable name of the failing stage, used in logs and reports.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::Store { .. } => "store",
            Self::FormatMismatch { .. } => "classify",
            Self::Validation(_) => "validate",
            Self::Cancelled => "cancelled",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LabelError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            LabelError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            LabelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        let fetch = LabelError::fetch(
            "a/b.png",
            StorageError::NotFound {
                bucket: "bkt".to_string(),
                key: "a/b.png".to_string(),
            },
        );
        assert!(fetch.to_string().contains("fetch error for 'a/b.png'"));
        assert_eq!(fetch.stage(), "fetch");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = LabelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.stage(), "other");
    }

    #[test]
    fn store_error_exposes_source() {
        let err = LabelError::store("k.png", StorageError::AccessDenied("nope".to_string()));
        let src = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(src.as_deref(), Some("access denied: nope"));
    }
}
