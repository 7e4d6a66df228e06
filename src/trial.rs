//! Trial lifecycle tracking.
//!
//! Coordinates trial bootstrap, revalidation, and extension with the
//! backend, and owns the terminal flag once expiry or fraud is reported.
//! A remaining-days value of 0 conflates "never started", "tampered", and
//! "exhausted" — the backend does not let callers tell these apart, and
//! neither does the tracker.

use crate::backend::{
    code, ExpirationReason, ExpirationSink, LicenseHandle, TrialMode, VerificationBackend,
};
use crate::error::{LicentiaError, LicentiaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of the trial as last seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    /// Whether the trial clock is integrity-checked by the backend.
    pub verified: bool,
    /// Whole days left as of the last backend query. 1 day means *at most*
    /// one day; it could be thirty seconds.
    pub days_remaining: u32,
    /// Opaque extra data carried through to the backend.
    pub extra_data: Option<String>,
    /// When the trial was last validated against the backend.
    pub last_validated_at: Option<DateTime<Utc>>,
    /// Set once the backend reports expiry or fraud; never cleared for the
    /// rest of the process.
    pub terminal: bool,
}

/// Tracks trial bootstrap/validation/extension for one license handle.
pub(crate) struct TrialTracker {
    backend: Arc<dyn VerificationBackend>,
    handle: LicenseHandle,
    sink: ExpirationSink,
    state: Option<TrialState>,
    terminal: bool,
}

fn mode_for(verified: bool) -> TrialMode {
    if verified {
        TrialMode::Verified
    } else {
        TrialMode::Unverified
    }
}

impl TrialTracker {
    pub(crate) fn new(
        backend: Arc<dyn VerificationBackend>,
        handle: LicenseHandle,
        sink: ExpirationSink,
    ) -> Self {
        Self {
            backend,
            handle,
            sink,
            state: None,
            terminal: false,
        }
    }

    /// Snapshot of the trial, if it has been started in this process.
    pub(crate) fn state(&self) -> Option<&TrialState> {
        self.state.as_ref()
    }

    /// Starts the trial on first call; revalidates stored data after that.
    pub(crate) fn start_or_validate(
        &mut self,
        verified: bool,
        extra_data: Option<&str>,
    ) -> LicentiaResult<()> {
        if self.terminal {
            return Err(LicentiaError::TrialExpired);
        }

        let ret = self
            .backend
            .use_trial(self.handle, mode_for(verified), extra_data, self.sink.clone());
        match ret {
            code::OK => {
                let days = self
                    .backend
                    .trial_days_remaining(self.handle, mode_for(verified));
                debug!(days, verified, "trial validated");
                self.state = Some(TrialState {
                    verified,
                    days_remaining: days,
                    extra_data: extra_data.map(str::to_string),
                    last_validated_at: Some(Utc::now()),
                    terminal: false,
                });
                Ok(())
            }
            code::TRIAL_CORRUPTED => {
                warn!("stored trial data failed its integrity check");
                Err(LicentiaError::TrialDataTampered)
            }
            code::TRIAL_EXPIRED => {
                self.mark_terminal();
                Err(LicentiaError::TrialExpired)
            }
            other => Err(LicentiaError::BackendContractViolation {
                operation: "use_trial",
                code: other,
            }),
        }
    }

    /// Whole days left in the given mode. 0 once terminal, without asking
    /// the backend again.
    pub(crate) fn days_remaining(&mut self, verified: bool) -> u32 {
        if self.terminal {
            return 0;
        }
        let days = self
            .backend
            .trial_days_remaining(self.handle, mode_for(verified));
        if let Some(state) = &mut self.state {
            state.days_remaining = days;
        }
        days
    }

    /// Days left for a trial started in this process; 0 if none was.
    /// Used by the reconciliation fallback, which only consults a trial the
    /// host actually began.
    pub(crate) fn current_days(&mut self) -> u32 {
        match &self.state {
            None => 0,
            Some(state) => {
                let verified = state.verified;
                self.days_remaining(verified)
            }
        }
    }

    /// Applies a server-issued extension code.
    pub(crate) fn extend(&mut self, extension_code: &str, verified: bool) -> LicentiaResult<()> {
        if self.terminal {
            return Err(LicentiaError::TrialExpired);
        }

        match self
            .backend
            .extend_trial(self.handle, mode_for(verified), extension_code)
        {
            code::OK => {
                let days = self.days_remaining(verified);
                debug!(days, "trial extended");
                Ok(())
            }
            code::EXTENSION_INVALID => Err(LicentiaError::ExtensionCodeInvalid),
            code::INET => Err(LicentiaError::NetworkUnavailable),
            other => Err(LicentiaError::BackendContractViolation {
                operation: "extend_trial",
                code: other,
            }),
        }
    }

    /// Applies an expiration notification drained from the channel.
    /// Idempotent: repeated or late notifications are harmless.
    pub(crate) fn apply_expiration(&mut self, reason: ExpirationReason) {
        match reason {
            ExpirationReason::NaturalExpiration => debug!("trial period has expired"),
            ExpirationReason::FraudDetected => {
                warn!("trial dropped: clock manipulation detected");
            }
        }
        self.mark_terminal();
    }

    fn mark_terminal(&mut self) {
        self.terminal = true;
        if let Some(state) = &mut self.state {
            state.days_remaining = 0;
            state.terminal = true;
        }
    }
}
