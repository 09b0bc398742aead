//! Unified error type for the ringlamp-lib crate.
//!
//! [`RinglampError`] wraps module-specific errors (`PublishError`, I/O, JSON)
//! and domain-specific error kinds (`Config`, `Color`, `Table`, `Editor`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::publish::PublishError;

/// Unified error type for ringlamp-lib operations.
#[derive(Debug)]
pub enum RinglampError {
    /// Handing a message to the transport failed.
    Publish(PublishError),
    /// Standard I/O error (file read/write, config persistence).
    Io(std::io::Error),
    /// Envelope or table JSON could not be read or written.
    Json(serde_json::Error),
    /// Configuration validation error.
    Config(String),
    /// Color or brightness parsing error.
    Color(String),
    /// Element table shape error (wrong length, index out of range).
    Table(String),
    /// Edit rejected in the current session state.
    Editor(String),
}

impl fmt::Display for RinglampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RinglampError::Publish(e) => write!(f, "{e}"),
            RinglampError::Io(e) => write!(f, "I/O error: {e}"),
            RinglampError::Json(e) => write!(f, "JSON error: {e}"),
            RinglampError::Config(e) => write!(f, "Config error: {e}"),
            RinglampError::Color(e) => write!(f, "Color error: {e}"),
            RinglampError::Table(e) => write!(f, "Table error: {e}"),
            RinglampError::Editor(e) => write!(f, "Edit rejected: {e}"),
        }
    }
}

impl std::error::Error for RinglampError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RinglampError::Publish(e) => Some(e),
            RinglampError::Io(e) => Some(e),
            RinglampError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PublishError> for RinglampError {
    fn from(e: PublishError) -> Self {
        RinglampError::Publish(e)
    }
}

impl From<std::io::Error> for RinglampError {
    fn from(e: std::io::Error) -> Self {
        RinglampError::Io(e)
    }
}

impl From<serde_json::Error> for RinglampError {
    fn from(e: serde_json::Error) -> Self {
        RinglampError::Json(e)
    }
}

/// Crate-level Result alias using [`RinglampError`].
pub type Result<T> = std::result::Result<T, RinglampError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_publish_error() {
        let e: RinglampError = PublishError::NotConnected.into();
        assert!(matches!(e, RinglampError::Publish(PublishError::NotConnected)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: RinglampError = io_err.into();
        assert!(matches!(e, RinglampError::Io(_)));
    }

    #[test]
    fn from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: RinglampError = json_err.into();
        assert!(matches!(e, RinglampError::Json(_)));
        assert!(e.to_string().starts_with("JSON error: "));
    }

    #[test]
    fn display_publish_error() {
        let e = RinglampError::Publish(PublishError::NotConnected);
        assert_eq!(e.to_string(), "Not connected to a broker");
    }

    #[test]
    fn display_string_variants() {
        assert_eq!(
            RinglampError::Config("bad".into()).to_string(),
            "Config error: bad"
        );
        assert_eq!(
            RinglampError::Color("bad hex".into()).to_string(),
            "Color error: bad hex"
        );
        assert_eq!(
            RinglampError::Table("short".into()).to_string(),
            "Table error: short"
        );
        assert_eq!(
            RinglampError::Editor("preset active".into()).to_string(),
            "Edit rejected: preset active"
        );
    }

    #[test]
    fn source_chains_publish_error() {
        let e = RinglampError::Publish(PublishError::Failed("broker gone".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("broker gone"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = RinglampError::Table("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_publish() {
        fn inner() -> crate::publish::Result<()> {
            Err(PublishError::Timeout(std::time::Duration::from_secs(1)))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, RinglampError::Publish(PublishError::Timeout(_))));
    }
}
