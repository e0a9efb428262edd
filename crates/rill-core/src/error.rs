//! Error types for rill-core

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use rill_router::PatternError;

/// Result type alias for rill operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the rill routing layer
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Routing configuration error
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// A handler registered in a group where it can never run
    #[error("{kind} handler registered under {tag} never runs")]
    MisplacedHandler { tag: String, kind: &'static str },

    /// IO error (native only)
    #[cfg(feature = "native")]
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// Listen address could not be resolved (native only)
    #[cfg(feature = "native")]
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// Hyper error (native only)
    #[cfg(feature = "native")]
    #[error("HTTP error: {0}")]
    Hyper(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "native")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

/// An error raised by a handler while dispatching a request
///
/// Carried opaquely through the dispatch engine as the "live error" until an
/// error handler resolves it. Clones share the same underlying value, so
/// every error handler along the way observes the original error
/// (see [`HandlerError::ptr_eq`]).
///
/// Any `std::error::Error + Send + Sync` converts into a `HandlerError`,
/// which lets handlers use `?` directly.
#[derive(Clone)]
pub struct HandlerError(Arc<dyn StdError + Send + Sync + 'static>);

impl HandlerError {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Create an error from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Whether both handles refer to the same raised error
    pub fn ptr_eq(&self, other: &HandlerError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Recover the concrete error type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::new(err)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_identity() {
        let err = HandlerError::msg("boom");
        let copy = err.clone();
        let other = HandlerError::msg("boom");

        assert!(err.ptr_eq(&copy));
        assert!(!err.ptr_eq(&other));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_downcast() {
        let err = HandlerError::from(Error::InvalidMethod("BREW".into()));

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidMethod(m)) if m == "BREW"
        ));
        assert!(err.downcast_ref::<PatternError>().is_none());
    }

    #[test]
    fn test_pattern_error_converts() {
        let err: Error = PatternError::UnsupportedReduction {
            pattern: "/foo".into(),
        }
        .into();

        assert!(err.to_string().contains("/foo"));
    }
}
