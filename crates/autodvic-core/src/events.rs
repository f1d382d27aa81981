//! Inter-component message vocabulary.
//!
//! The popup, background relay, and page automation exchange a small set of
//! one-shot named messages. These are notifications and commands, not a
//! protocol: there is no acknowledgement or retry.

use crate::types::{InspectionSubmission, VehicleInfo};
use serde::{Deserialize, Serialize};

/// One message exchanged between the operator surface and the automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Start the submission flow with the assembled form data.
    StartSubmission {
        /// The submission to drive through the portal
        data: InspectionSubmission,
    },

    /// The submission flow aborted with an error.
    SubmissionError {
        /// Human-readable error description
        error: String,
    },

    /// Show a stacked, auto-expiring on-page notification.
    ShowNotification {
        /// Notification title
        title: String,
        /// Notification body
        message: String,
    },

    /// Show a dismissible on-page alert.
    ShowAlert {
        /// Alert title
        title: String,
        /// Alert body
        message: String,
    },

    /// Fresh vehicle facts were extracted from the portal page.
    VehicleInfoUpdated {
        /// The extracted record
        data: VehicleInfo,
    },

    /// The injected page control was clicked; open the operator form.
    OpenPopupFromPage,
}
