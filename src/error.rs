//! Error types for navigation orchestration.

use std::sync::Arc;

/// Shared, cloneable error source.
///
/// Failure observers and the caller-facing outcome all receive the same error,
/// so sources are reference counted rather than boxed.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type for navigation operations.
pub type Result<T> = std::result::Result<T, NavigationError>;

/// Errors surfaced through a request's failure observers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NavigationError {
    /// A lazy factory or class factory failed to produce a destination.
    #[error("Resolution failed: {0}")]
    Resolution(SharedError),

    /// The protection space cancelled the navigation with a cause.
    #[error("Protection cancelled navigation: {0}")]
    Protection(SharedError),

    /// A routing lookup found no destination for the path.
    #[error("No route for path '{0}'")]
    RoutingMiss(String),

    /// A collaborator panicked while the navigation was running.
    #[error("Navigation panicked: {0}")]
    Panicked(String),
}

impl NavigationError {
    /// Wrap any error as a resolution failure.
    pub fn resolution<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NavigationError::Resolution(Arc::new(error))
    }

    /// Wrap any error as a protection failure.
    pub fn protection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NavigationError::Protection(Arc::new(error))
    }

    /// Build a resolution failure from a plain message.
    pub fn resolution_msg(message: impl Into<String>) -> Self {
        NavigationError::Resolution(Arc::new(MessageError(message.into())))
    }

    /// Build a protection failure from a plain message.
    pub fn protection_msg(message: impl Into<String>) -> Self {
        NavigationError::Protection(Arc::new(MessageError(message.into())))
    }

    /// Short machine-friendly kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            NavigationError::Resolution(_) => "resolution",
            NavigationError::Protection(_) => "protection",
            NavigationError::RoutingMiss(_) => "routing_miss",
            NavigationError::Panicked(_) => "panicked",
        }
    }
}

/// Plain-text error for collaborators that only have a message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MessageError(pub String);

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}
