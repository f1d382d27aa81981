//! On-page operator notices.
//!
//! Notices render as stacked, dismissible cards on the portal page and
//! auto-expire; errors persist longest. They replace blocking native
//! alerts so the automation never leaves the page in an unexplained state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Severity of a notice, driving color and display duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
    Info,
    Success,
}

impl NoticeLevel {
    /// How long the notice stays on screen before auto-expiring.
    #[must_use]
    pub fn display_duration(&self) -> Duration {
        match self {
            Self::Error => Duration::from_secs(15),
            Self::Warning => Duration::from_secs(10),
            Self::Info => Duration::from_secs(7),
            Self::Success => Duration::from_secs(5),
        }
    }
}

/// One operator-facing notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }
}
