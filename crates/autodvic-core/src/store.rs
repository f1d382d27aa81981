//! Ephemeral JSON state store.
//!
//! Holds the last-extracted vehicle facts and the last-submitted form data,
//! overwritten on every extraction/submission. Nothing here is long-lived
//! application state; losing the file only costs a re-extraction.

use crate::error::{AutoDvicError, Result};
use crate::types::{InspectionSubmission, VehicleInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted ephemeral state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredState {
    /// Vehicle facts from the most recent extraction
    pub vehicle_info: Option<VehicleInfo>,
    /// Most recently submitted form data
    pub last_submission: Option<InspectionSubmission>,
    /// When this state was last written
    pub updated_at: Option<DateTime<Utc>>,
}

/// File-backed store for [`StoredState`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current state, or defaults when the file does not exist.
    pub fn load(&self) -> Result<StoredState> {
        if !self.path.exists() {
            return Ok(StoredState::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents)
            .map_err(|e| AutoDvicError::Store(format!("corrupt state file: {e}")))
    }

    /// Record freshly extracted vehicle facts, overwriting the previous record.
    pub fn record_vehicle_info(&self, info: &VehicleInfo) -> Result<()> {
        let mut state = self.load()?;
        state.vehicle_info = Some(info.clone());
        self.save(&mut state)
    }

    /// Record the most recent submission.
    pub fn record_submission(&self, submission: &InspectionSubmission) -> Result<()> {
        let mut state = self.load()?;
        state.last_submission = Some(submission.clone());
        self.save(&mut state)
    }

    fn save(&self, state: &mut StoredState) -> Result<()> {
        state.updated_at = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| AutoDvicError::Store(format!("serialize state: {e}")))?;
        fs::write(&self.path, contents)?;

        tracing::debug!(path = %self.path.display(), "saved state");
        Ok(())
    }
}
