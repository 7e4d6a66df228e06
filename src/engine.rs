//! License reconciliation engine.
//!
//! Orchestrates genuineness checks against the verification backend and
//! produces the single authoritative decision: may this process run, and in
//! what mode. Grace-period handling, the caller-driven reverification path,
//! and the trial fallback all live here.
//!
//! Engine operations are blocking `&mut self` calls with no internal
//! locking; a host sharing one engine across threads must serialize access
//! itself. The only cross-thread input is the trial expiration channel,
//! which the engine drains at the start of every reconciliation pass.

use crate::backend::{
    code, ExpirationReason, ExpirationSink, LicenseHandle, VerificationBackend,
};
use crate::error::{LicentiaError, LicentiaResult};
use crate::outcome::{classify, CheckFamily, GenuineOutcome};
use crate::policy::ReconcilePolicy;
use crate::trial::{TrialState, TrialTracker};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Genuineness state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No reconciliation has run yet.
    Unchecked,
    /// A check is in flight.
    Verifying,
    /// The last check confirmed a live activation, or an internet failure
    /// inside the grace window with a local activation record.
    Genuine,
    /// Checks fail but a local activation record survives: server contact
    /// has been blocked past the grace window. The host must prompt for
    /// reverification instead of blocking outright.
    NotGenuineButLocallyValid,
    /// No activation record and the last check was not genuine.
    Blocked,
}

/// Final output of a reconciliation pass. Derived, never stored; recomputed
/// on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationDecision {
    /// A valid activation exists, or one inside its grace window.
    Activated,
    /// No activation, but a running trial with this many days left.
    TrialActive(u32),
    /// A local activation record survives but the servers could not confirm
    /// it within the policy window. The host must reverify (see
    /// [`ReconcileEngine::force_recheck`]) before continuing.
    RequiresReverification,
    /// No activation and no usable trial.
    Blocked,
}

/// The license reconciliation engine. One instance per product per process.
pub struct ReconcileEngine {
    backend: Arc<dyn VerificationBackend>,
    handle: LicenseHandle,
    state: EngineState,
    last_outcome: Option<GenuineOutcome>,
    trial: TrialTracker,
    expirations: mpsc::Receiver<ExpirationReason>,
}

impl ReconcileEngine {
    /// Acquires a handle for `product_id` and builds the engine around it.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::HandleInvalid`] if the backend does not
    /// recognize the product identifier or its product data is missing.
    pub fn new(backend: Arc<dyn VerificationBackend>, product_id: &str) -> LicentiaResult<Self> {
        let handle = backend
            .acquire_handle(product_id)
            .ok_or_else(|| LicentiaError::HandleInvalid(product_id.to_string()))?;
        debug!(%handle, product_id, "license handle acquired");

        let (sink, expirations) = ExpirationSink::channel();
        Ok(Self {
            trial: TrialTracker::new(Arc::clone(&backend), handle, sink),
            backend,
            handle,
            state: EngineState::Unchecked,
            last_outcome: None,
            expirations,
        })
    }

    /// Current genuineness state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Outcome of the most recent genuineness check, if any ran.
    #[must_use]
    pub fn last_outcome(&self) -> Option<GenuineOutcome> {
        self.last_outcome
    }

    /// The handle this engine owns.
    #[must_use]
    pub fn handle(&self) -> LicenseHandle {
        self.handle
    }

    /// Snapshot of the trial, if it has been started in this process.
    #[must_use]
    pub fn trial_state(&self) -> Option<&TrialState> {
        self.trial.state()
    }

    // ── Reconciliation ───────────────────────────────────────────

    /// Runs one reconciliation pass and returns the authoritative decision.
    ///
    /// Drains pending trial expiration notifications, performs the extended
    /// genuineness check under `policy`, applies the state transitions, and
    /// falls back to the trial when no genuine activation exists. Blocks for
    /// exactly one backend check (plus an activation-record lookup on the
    /// degraded paths); retries are always caller-driven.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::PolicyInvalid`] for an out-of-bounds policy
    /// and [`LicentiaError::BackendContractViolation`] for an unrecognized
    /// backend code. Expected network failure is not an error; it is
    /// encoded in the decision.
    pub fn reconcile(&mut self, policy: &ReconcilePolicy) -> LicentiaResult<ActivationDecision> {
        policy.validate()?;
        self.drain_expirations();

        self.state = EngineState::Verifying;
        let raw = self
            .backend
            .check_genuine_extended(self.handle, &policy.to_options());
        let outcome = classify(raw, CheckFamily::Extended)?;
        self.last_outcome = Some(outcome);
        debug!(?outcome, "extended genuineness check");

        let decision = match outcome {
            GenuineOutcome::Genuine | GenuineOutcome::GenuineFeaturesChanged => {
                self.state = EngineState::Genuine;
                ActivationDecision::Activated
            }
            GenuineOutcome::InternetError => {
                if self.is_activated()? {
                    // Activated but the servers were unreachable. The
                    // backend only reports this while the grace window
                    // still holds; past it the check fails outright.
                    warn!("activation servers unreachable; grace period applies");
                    self.state = EngineState::Genuine;
                    ActivationDecision::Activated
                } else {
                    self.state = EngineState::Blocked;
                    self.trial_fallback()
                }
            }
            GenuineOutcome::NotGenuine | GenuineOutcome::NotGenuineInVM => {
                if self.is_activated()? {
                    // Server contact has been blocked for longer than
                    // days_between_checks + grace_period_days, yet the local
                    // record is still valid. Not an automatic block: the
                    // host prompts the user and retries via force_recheck.
                    warn!("local activation record present but reverification required");
                    self.state = EngineState::NotGenuineButLocallyValid;
                    ActivationDecision::RequiresReverification
                } else {
                    self.state = EngineState::Blocked;
                    self.trial_fallback()
                }
            }
        };

        debug!(state = ?self.state, ?decision, "reconciliation pass complete");
        Ok(decision)
    }

    /// Immediate genuineness check for the reverification retry path.
    ///
    /// Unlike [`reconcile`](Self::reconcile) this never applies the
    /// grace-period policy and never defers server contact: a single
    /// internet failure surfaces as [`GenuineOutcome::InternetError`]. The
    /// caller decides when to retry; the engine never retries on its own.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::BackendContractViolation`] for an
    /// unrecognized backend code.
    pub fn force_recheck(&mut self) -> LicentiaResult<GenuineOutcome> {
        let raw = self.backend.check_genuine(self.handle);
        let outcome = classify(raw, CheckFamily::Single)?;
        self.last_outcome = Some(outcome);
        debug!(?outcome, "immediate genuineness check");

        if outcome.is_genuine() {
            self.state = EngineState::Genuine;
        }
        Ok(outcome)
    }

    /// Whether a local activation record exists on this machine. This does
    /// not verify genuineness with the servers; use
    /// [`reconcile`](Self::reconcile) for that.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::BackendContractViolation`] for an
    /// unrecognized backend code.
    pub fn is_activated(&self) -> LicentiaResult<bool> {
        match self.backend.is_activated(self.handle) {
            code::OK => Ok(true),
            code::FAIL => Ok(false),
            other => Err(LicentiaError::BackendContractViolation {
                operation: "is_activated",
                code: other,
            }),
        }
    }

    // ── Activation & product key ─────────────────────────────────

    /// Activates the product on this machine. A product key must have been
    /// saved first (see [`check_and_save_product_key`](Self::check_and_save_product_key)).
    ///
    /// # Errors
    ///
    /// Returns a typed error for every recognized failure code; activation
    /// has no outcome enum, so network failure surfaces as
    /// [`LicentiaError::NetworkUnavailable`].
    pub fn activate(&mut self, extra_data: Option<&str>) -> LicentiaResult<()> {
        match self.backend.activate(self.handle, extra_data) {
            code::OK => {
                debug!("activation succeeded");
                self.state = EngineState::Genuine;
                Ok(())
            }
            code::INET => Err(LicentiaError::NetworkUnavailable),
            code::PRODUCT_KEY_INVALID => Err(LicentiaError::ProductKeyInvalid),
            code::REVOKED => Err(LicentiaError::KeyRevoked),
            other => Err(LicentiaError::BackendContractViolation {
                operation: "activate",
                code: other,
            }),
        }
    }

    /// Deactivates the product on this machine. Keeping the stored product
    /// key lets the user reactivate later without retyping it.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::NotActivated`] when there is nothing to
    /// deactivate, or [`LicentiaError::NetworkUnavailable`] when the
    /// servers could not be told.
    pub fn deactivate(&mut self, erase_product_key: bool) -> LicentiaResult<()> {
        match self.backend.deactivate(self.handle, erase_product_key) {
            code::OK => {
                debug!(erase_product_key, "deactivated");
                self.state = EngineState::Unchecked;
                self.last_outcome = None;
                Ok(())
            }
            code::INET => Err(LicentiaError::NetworkUnavailable),
            code::MUST_ACTIVATE => Err(LicentiaError::NotActivated),
            other => Err(LicentiaError::BackendContractViolation {
                operation: "deactivate",
                code: other,
            }),
        }
    }

    /// Validates `key` and stores it for later activation. Returns `false`
    /// when the key is well-formed but not valid for this product version.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::NetworkUnavailable`] when validation needed
    /// the servers and could not reach them.
    pub fn check_and_save_product_key(&self, key: &str) -> LicentiaResult<bool> {
        match self.backend.check_and_save_product_key(self.handle, key) {
            code::OK => Ok(true),
            code::FAIL => Ok(false),
            code::INET => Err(LicentiaError::NetworkUnavailable),
            other => Err(LicentiaError::BackendContractViolation {
                operation: "check_and_save_product_key",
                code: other,
            }),
        }
    }

    // ── Trial lifecycle ──────────────────────────────────────────

    /// Starts the trial the first time it is called; afterwards revalidates
    /// that the stored trial data has not been tampered with. Idempotent
    /// per process.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::TrialDataTampered`] when a verified trial
    /// fails its integrity check and [`LicentiaError::TrialExpired`] once
    /// the trial is over.
    pub fn start_or_validate_trial(
        &mut self,
        verified: bool,
        extra_data: Option<&str>,
    ) -> LicentiaResult<()> {
        self.drain_expirations();
        self.trial.start_or_validate(verified, extra_data)
    }

    /// Whole trial days remaining. Returns 0 for a trial that never
    /// started, was tampered with, or is exhausted — the backend does not
    /// distinguish these, and neither does the engine.
    pub fn trial_days_remaining(&mut self, verified: bool) -> u32 {
        self.drain_expirations();
        self.trial.days_remaining(verified)
    }

    /// Applies a server-issued trial extension code.
    ///
    /// # Errors
    ///
    /// Returns [`LicentiaError::ExtensionCodeInvalid`] for a rejected or
    /// already-consumed code, and [`LicentiaError::TrialExpired`] once the
    /// trial has gone terminal in this process.
    pub fn extend_trial(&mut self, extension_code: &str, verified: bool) -> LicentiaResult<()> {
        self.drain_expirations();
        self.trial.extend(extension_code, verified)
    }

    /// Dequeues one pending trial expiration notification, applying it to
    /// the trial state before returning it.
    ///
    /// The backend delivers notifications on its own thread; they are only
    /// ever observed here and at the start of [`reconcile`](Self::reconcile),
    /// so notification and reconciliation results stay consistent when
    /// queried in sequence.
    pub fn poll_expiration(&mut self) -> Option<ExpirationReason> {
        let reason = self.expirations.try_recv().ok()?;
        self.trial.apply_expiration(reason);
        Some(reason)
    }

    fn drain_expirations(&mut self) {
        while let Ok(reason) = self.expirations.try_recv() {
            self.trial.apply_expiration(reason);
        }
    }

    fn trial_fallback(&mut self) -> ActivationDecision {
        match self.trial.current_days() {
            0 => ActivationDecision::Blocked,
            days => ActivationDecision::TrialActive(days),
        }
    }
}
