//! The verification backend capability boundary.
//!
//! The native licensing engine (signature checks, hardware fingerprinting,
//! trial clocks, server protocol) sits behind the [`VerificationBackend`]
//! trait. Implementations wrap the FFI boundary — or a test double — and
//! keep all raw-pointer marshalling behind this one seam. Methods return
//! raw status codes from [`code`]; translation into outcomes and typed
//! errors happens in the engine, never here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::sync::mpsc;

/// Raw status codes returned by the verification backend.
///
/// The backend contract is closed: every operation returns one of these
/// values. Anything else is a contract violation and aborts reconciliation.
pub mod code {
    /// Operation succeeded.
    pub const OK: i32 = 0;
    /// Operation failed; the meaning depends on the operation.
    pub const FAIL: i32 = 1;
    /// The product key is missing or not valid for this product.
    pub const PRODUCT_KEY_INVALID: i32 = 2;
    /// The operation requires a prior activation.
    pub const MUST_ACTIVATE: i32 = 3;
    /// The activation servers could not be reached.
    pub const INET: i32 = 4;
    /// The activation belongs to a different machine; this is a VM copy.
    pub const IN_VM: i32 = 5;
    /// The product key has been revoked by the license authority.
    pub const REVOKED: i32 = 6;
    /// Activation is valid but the licensed feature set changed server-side.
    pub const FEATURES_CHANGED: i32 = 7;
    /// A failed server contact was deferred; the backend will retry later.
    /// Only the extended check reports this.
    pub const INET_DELAYED: i32 = 8;
    /// The trial period is over.
    pub const TRIAL_EXPIRED: i32 = 9;
    /// Stored trial data failed its integrity check.
    pub const TRIAL_CORRUPTED: i32 = 10;
    /// The trial extension code was rejected or already consumed.
    pub const EXTENSION_INVALID: i32 = 11;
}

/// Opaque identifier for a product session with the backend.
///
/// Acquired once at engine construction and valid for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LicenseHandle(NonZeroU64);

impl LicenseHandle {
    /// Wraps a raw handle value. Returns `None` for the backend's zero
    /// sentinel, which means the product identifier was not recognized.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for LicenseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Whether the trial clock is integrity-checked by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialMode {
    /// Remaining time is protected against local clock tampering.
    Verified,
    /// Plain local trial with no tamper protection.
    Unverified,
}

/// Option block for the extended genuineness check.
///
/// Lowered from [`ReconcilePolicy`](crate::ReconcilePolicy); the backend
/// owns the clocks and persistence that make these fields meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenuineOptions {
    /// Minimum days before a networked re-check is required.
    pub days_between_checks: u32,
    /// Extra days an internet failure is tolerated before re-verification.
    pub grace_period_days: u32,
    /// Accept an offline cached pass instead of contacting the servers.
    pub skip_offline: bool,
    /// Surface a suppressed internet error when falling back to offline.
    pub show_inet_error_offline: bool,
}

/// Why the backend declared the trial over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationReason {
    /// The trial ran out of days.
    NaturalExpiration,
    /// The trial clock was manipulated (e.g. via sleep/hibernate tampering).
    FraudDetected,
}

/// Cloneable handle the backend uses to report trial expiration.
///
/// The backend may call [`notify`](Self::notify) from any thread, any number
/// of times, including after the trial was already found expired through
/// `trial_days_remaining`. Notification is one-way: it enqueues the reason
/// on a channel drained by the engine, never blocks, and never panics —
/// even once the engine is gone.
#[derive(Debug, Clone)]
pub struct ExpirationSink {
    tx: mpsc::Sender<ExpirationReason>,
}

impl ExpirationSink {
    /// Creates a sink and the receiving end the engine drains.
    pub(crate) fn channel() -> (Self, mpsc::Receiver<ExpirationReason>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Reports a trial expiration. Safe to call from any thread.
    pub fn notify(&self, reason: ExpirationReason) {
        // A closed channel just means nobody is listening anymore.
        let _ = self.tx.send(reason);
    }
}

/// Capability surface of the native verification engine.
///
/// Genuineness checks and `is_activated` answer with codes the engine
/// classifies; the remaining operations answer `OK` or a failure code the
/// engine translates into a typed error. Network timeouts are owned by the
/// backend — callers cannot cancel a call in flight.
pub trait VerificationBackend: Send + Sync {
    /// Resolves a handle for the given product identifier. Returns `None`
    /// when the product data is missing or the identifier is unknown.
    fn acquire_handle(&self, product_id: &str) -> Option<LicenseHandle>;

    /// Immediate genuineness check; always attempts server contact.
    fn check_genuine(&self, handle: LicenseHandle) -> i32;

    /// Extended genuineness check honoring the re-check interval and grace
    /// policy in `options`.
    fn check_genuine_extended(&self, handle: LicenseHandle, options: &GenuineOptions) -> i32;

    /// Whether a local activation record exists. `OK` or `FAIL`.
    fn is_activated(&self, handle: LicenseHandle) -> i32;

    /// Starts the trial on first call; revalidates stored trial data after
    /// that. Expirations are reported through `notify`, possibly from a
    /// backend-managed thread.
    fn use_trial(
        &self,
        handle: LicenseHandle,
        mode: TrialMode,
        extra_data: Option<&str>,
        notify: ExpirationSink,
    ) -> i32;

    /// Whole trial days left. 0 for absent, tampered, or exhausted trials.
    fn trial_days_remaining(&self, handle: LicenseHandle, mode: TrialMode) -> u32;

    /// Applies a server-issued trial extension code.
    fn extend_trial(&self, handle: LicenseHandle, mode: TrialMode, code: &str) -> i32;

    /// Activates the product on this machine.
    fn activate(&self, handle: LicenseHandle, extra_data: Option<&str>) -> i32;

    /// Deactivates the product, optionally erasing the stored product key.
    fn deactivate(&self, handle: LicenseHandle, erase_product_key: bool) -> i32;

    /// Validates and stores a product key. `OK` or `FAIL`.
    fn check_and_save_product_key(&self, handle: LicenseHandle, key: &str) -> i32;
}
