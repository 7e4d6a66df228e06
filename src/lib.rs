//! Client-side license-state reconciliation.
//!
//! The native licensing engine — cryptographic license validation, trial
//! clocks, hardware fingerprinting, the activation-server protocol — lives
//! behind the [`VerificationBackend`] capability trait. This crate owns the
//! decision logic on top of it:
//!
//! - **Outcome classification**: raw backend status codes normalize into the
//!   closed [`GenuineOutcome`] enum, per check family
//! - **Reconciliation**: [`ReconcileEngine::reconcile`] runs the periodic
//!   genuineness check under a [`ReconcilePolicy`] (check interval, grace
//!   period, offline handling) and returns one [`ActivationDecision`]
//! - **Trial lifecycle**: bootstrap, revalidation, and extension of verified
//!   and unverified trials, with expiration notifications delivered through
//!   a thread-safe channel instead of a raw cross-thread callback
//!
//! # Design Principles
//!
//! - **One seam for the native ABI**: everything wire-level stays behind
//!   `VerificationBackend`; the engine never sees raw pointers or buffers
//! - **Outcomes over exceptions**: expected network failure is a value
//!   ([`GenuineOutcome::InternetError`]), never an error
//! - **Caller-driven retries**: the engine never sleeps, loops, or
//!   schedules; every retry — reverification included — happens on the
//!   host's cadence
//! - **No internal locking**: engine operations are blocking `&mut self`
//!   calls; hosts serialize access to a shared engine themselves

mod backend;
mod engine;
mod error;
mod outcome;
mod policy;
mod trial;

pub use backend::{
    code, ExpirationReason, ExpirationSink, GenuineOptions, LicenseHandle, TrialMode,
    VerificationBackend,
};
pub use engine::{ActivationDecision, EngineState, ReconcileEngine};
pub use error::{LicentiaError, LicentiaResult};
pub use outcome::{classify, CheckFamily, GenuineOutcome};
pub use policy::ReconcilePolicy;
pub use trial::TrialState;
