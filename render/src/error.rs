//! Error types for rendering and writing artifacts.

use thiserror::Error;

/// Errors that can occur while rendering a schema tree or writing the result.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The dispatcher has no handler for the node's exact type.
    #[error("no {renderer} renderer registered for type `{type_name}`")]
    NoRenderer {
        renderer: &'static str,
        type_name: &'static str,
    },

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or serialized.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The temporary output file could not be moved into place.
    #[error("failed to persist output: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Convenience alias for results with [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;
