//! Reconciliation policy configuration.

use crate::backend::GenuineOptions;
use crate::error::{LicentiaError, LicentiaResult};
use serde::{Deserialize, Serialize};

/// Policy for networked re-checks and offline tolerance.
///
/// The defaults carry the vendor-recommended 90/14 values. Going below 7
/// days for either interval mostly punishes legitimate users with flaky
/// connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Minimum interval before a networked re-check is required. Must be >= 1.
    pub days_between_checks: u32,
    /// Extra days an internet-check failure is tolerated before
    /// re-verification is forced.
    pub grace_period_days: u32,
    /// Accept an offline cached pass instead of contacting the servers.
    pub skip_offline: bool,
    /// Still surface a suppressed internet error when falling back to offline.
    pub show_inet_error_offline: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            days_between_checks: 90,
            grace_period_days: 14,
            skip_offline: false,
            show_inet_error_offline: false,
        }
    }
}

impl ReconcilePolicy {
    /// Checks the documented bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::PolicyInvalid`] if `days_between_checks` is zero.
    pub fn validate(&self) -> LicentiaResult<()> {
        if self.days_between_checks == 0 {
            return Err(LicentiaError::PolicyInvalid(
                "days_between_checks must be at least 1",
            ));
        }
        Ok(())
    }

    /// Lowers the policy into the backend's option block.
    pub(crate) fn to_options(self) -> GenuineOptions {
        GenuineOptions {
            days_between_checks: self.days_between_checks,
            grace_period_days: self.grace_period_days,
            skip_offline: self.skip_offline,
            show_inet_error_offline: self.show_inet_error_offline,
        }
    }
}
