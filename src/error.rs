use std::io;
use thiserror::Error;

/// Custom error type for the panel controller
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed trigger, group or module definitions. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render dispatch failed: {0}")]
    RenderDispatch(String),

    #[error("Metrics unavailable: {0}")]
    ContextUnavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the panel controller
pub type Result<T> = std::result::Result<T, PanelError>;

impl PanelError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PanelError::Config(msg.into())
    }

    /// Create a render dispatch error
    pub fn render_dispatch<S: Into<String>>(msg: S) -> Self {
        PanelError::RenderDispatch(msg.into())
    }

    /// Create a context unavailable error
    pub fn context_unavailable<S: Into<String>>(msg: S) -> Self {
        PanelError::ContextUnavailable(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PanelError::Other(msg.into())
    }

    /// Only configuration problems stop the process; everything else degrades.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PanelError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(PanelError::config("section 'top' has no normal group").is_fatal());
        assert!(!PanelError::render_dispatch("panel busy").is_fatal());
        assert!(!PanelError::context_unavailable("no metrics file").is_fatal());
        assert!(!PanelError::other("x").is_fatal());
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/paneld/frame.json")?)
        }
        let err = read().unwrap_err();
        assert!(matches!(err, PanelError::Io(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = PanelError::config("missing normal");
        assert_eq!(err.to_string(), "Configuration error: missing normal");

        let err = PanelError::render_dispatch("clock_module: timeout");
        assert_eq!(err.to_string(), "Render dispatch failed: clock_module: timeout");
    }
}
