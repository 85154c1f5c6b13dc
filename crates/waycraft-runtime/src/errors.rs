//! Collaborator error types and their mapping onto [`CraftError`].

use waycraft_core::{CraftError, ItemHandle};

/// Failure reported by an [`ActionExecutor`](crate::collaborators::ActionExecutor).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The target no longer matches what the caller believed (moved, gone,
    /// or in the wrong state). Recoverable: skip and re-validate.
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// The input backend itself is unusable.
    #[error("input backend unavailable: {0}")]
    Backend(String),
}

impl ActionError {
    /// Classify against the handle the action was aimed at.
    pub fn into_craft_error(self, handle: ItemHandle) -> CraftError {
        match self {
            Self::ActionFailed(detail) => CraftError::StaleHandle { handle, detail },
            Self::Backend(detail) => CraftError::Unexpected(detail),
        }
    }
}

/// Failure reported by a [`SnapshotProvider`](crate::collaborators::SnapshotProvider).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The handle does not resolve to an item any more.
    #[error("{0} not found in inventory")]
    NotFound(ItemHandle),

    /// The host process could not be read at all.
    #[error("snapshot unavailable: {0}")]
    Unavailable(String),
}

impl From<SnapshotError> for CraftError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::NotFound(handle) => CraftError::StaleHandle {
                handle,
                detail: "no longer in inventory".into(),
            },
            SnapshotError::Unavailable(detail) => CraftError::Unexpected(detail),
        }
    }
}

/// Failure loading a simulator fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    /// The fixture file is not valid JSON for the fixture schema.
    #[error("failed to parse fixture JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn action_failed_becomes_stale_handle() {
        let err = ActionError::ActionFailed("item moved".into()).into_craft_error(ItemHandle::new(9));
        assert_matches!(err, CraftError::StaleHandle { handle, ref detail } if handle == ItemHandle::new(9) && detail == "item moved");
        assert!(!err.escalates());
    }

    #[test]
    fn backend_failure_escalates() {
        let err = ActionError::Backend("no window".into()).into_craft_error(ItemHandle::new(1));
        assert_matches!(err, CraftError::Unexpected(_));
        assert!(err.escalates());
    }

    #[test]
    fn snapshot_errors_map_by_blast_radius() {
        let stale: CraftError = SnapshotError::NotFound(ItemHandle::new(2)).into();
        assert_eq!(stale.category(), "stale_handle");

        let fatal: CraftError = SnapshotError::Unavailable("process exited".into()).into();
        assert_eq!(fatal.category(), "unexpected");
    }

    #[test]
    fn display() {
        assert_eq!(
            SnapshotError::NotFound(ItemHandle::new(5)).to_string(),
            "item#5 not found in inventory"
        );
        assert_eq!(
            ActionError::ActionFailed("workspace closed".into()).to_string(),
            "action failed: workspace closed"
        );
    }
}
