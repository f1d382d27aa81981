use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("stale element handle: {0}")]
    StaleElement(u64),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("wait cancelled: {0}")]
    Cancelled(String),

    #[error("selector config error: {0}")]
    Config(String),
}
