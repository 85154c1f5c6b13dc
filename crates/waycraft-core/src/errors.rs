//! Error taxonomy for crafting sessions.
//!
//! Failures local to one operation or one item never escalate past that
//! item. Only [`CraftError::PreconditionFailed`] and
//! [`CraftError::Cancelled`] reach the session controller, and anything
//! unclassified becomes [`CraftError::Unexpected`], which faults the session.

use tracing::Level;

use crate::item::{ItemHandle, Resource};

/// Errors raised while planning or executing crafting work.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CraftError {
    /// Not enough currency or reagent for the requested operation.
    #[error("shortage of {resource}: need {needed}, have {available}")]
    Shortage {
        /// What ran short.
        resource: Resource,
        /// Units the operation required.
        needed: u32,
        /// Units that were actually obtainable.
        available: u32,
    },

    /// External state diverged from a cached handle.
    #[error("stale handle {handle}: {detail}")]
    StaleHandle {
        /// The handle that no longer resolves.
        handle: ItemHandle,
        /// What the executor or provider reported.
        detail: String,
    },

    /// A blocking external state prevents the session from starting.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The user requested an emergency stop.
    #[error("cancelled")]
    Cancelled,

    /// Anything else.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CraftError {
    /// Whether the error aborts the whole session rather than one item.
    pub fn escalates(&self) -> bool {
        matches!(
            self,
            Self::PreconditionFailed(_) | Self::Cancelled | Self::Unexpected(_)
        )
    }

    /// Short classification string for logs and reports.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Shortage { .. } => "shortage",
            Self::StaleHandle { .. } => "stale_handle",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::Cancelled => "cancelled",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Log severity: item-local problems are informational, session-level
    /// problems are errors.
    pub fn severity(&self) -> Level {
        match self {
            Self::Shortage { .. } | Self::StaleHandle { .. } => Level::INFO,
            Self::Cancelled => Level::WARN,
            Self::PreconditionFailed(_) | Self::Unexpected(_) => Level::ERROR,
        }
    }
}

/// Result alias for crafting operations.
pub type Result<T> = std::result::Result<T, CraftError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{CurrencyKind, ReagentKind};

    fn shortage() -> CraftError {
        CraftError::Shortage {
            resource: Resource::Reagent(ReagentKind::LiquidParanoia),
            needed: 3,
            available: 2,
        }
    }

    #[test]
    fn shortage_display() {
        assert_eq!(
            shortage().to_string(),
            "shortage of Liquid Paranoia: need 3, have 2"
        );
    }

    #[test]
    fn stale_handle_display() {
        let err = CraftError::StaleHandle {
            handle: ItemHandle::new(4),
            detail: "item moved".into(),
        };
        assert_eq!(err.to_string(), "stale handle item#4: item moved");
    }

    #[test]
    fn escalation_classification() {
        assert!(!shortage().escalates());
        assert!(
            !CraftError::StaleHandle {
                handle: ItemHandle::new(1),
                detail: String::new()
            }
            .escalates()
        );
        assert!(CraftError::PreconditionFailed("stash open".into()).escalates());
        assert!(CraftError::Cancelled.escalates());
        assert!(CraftError::Unexpected("boom".into()).escalates());
    }

    #[test]
    fn category_strings() {
        assert_eq!(shortage().category(), "shortage");
        assert_eq!(CraftError::Cancelled.category(), "cancelled");
        assert_eq!(
            CraftError::PreconditionFailed("x".into()).category(),
            "precondition_failed"
        );
        assert_eq!(CraftError::Unexpected("x".into()).category(), "unexpected");
    }

    #[test]
    fn severity_tracks_blast_radius() {
        assert_eq!(shortage().severity(), Level::INFO);
        assert_eq!(
            CraftError::Shortage {
                resource: Resource::Currency(CurrencyKind::Regal),
                needed: 1,
                available: 0,
            }
            .severity(),
            Level::INFO
        );
        assert_eq!(
            CraftError::PreconditionFailed("x".into()).severity(),
            Level::ERROR
        );
        assert_eq!(CraftError::Unexpected("x".into()).severity(), Level::ERROR);
    }
}
