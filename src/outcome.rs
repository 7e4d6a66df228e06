//! Outcome classification for genuineness checks.
//!
//! The backend answers genuineness checks with raw integer codes drawn from
//! overlapping but not identical sets per check family. [`classify`]
//! normalizes them into the closed [`GenuineOutcome`] enum; policy code
//! never inspects raw codes directly.

use crate::backend::code;
use crate::error::{LicentiaError, LicentiaResult};
use serde::{Deserialize, Serialize};

/// Semantic result of a genuineness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenuineOutcome {
    /// Backend-confirmed valid activation.
    Genuine,
    /// Valid activation, but the licensed feature set changed server-side.
    GenuineFeaturesChanged,
    /// No valid activation: failed, revoked, or never activated.
    NotGenuine,
    /// The activation is bound to a different machine; this is a VM copy.
    NotGenuineInVM,
    /// The backend could not reach the activation servers.
    InternetError,
}

impl GenuineOutcome {
    /// True for the outcomes that confirm a live activation.
    #[must_use]
    pub fn is_genuine(&self) -> bool {
        matches!(self, Self::Genuine | Self::GenuineFeaturesChanged)
    }
}

/// Which check issued the raw code being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckFamily {
    /// The immediate check ([`check_genuine`](crate::VerificationBackend::check_genuine)).
    Single,
    /// The extended check, which may additionally report a deferred-retry
    /// code when the backend postponed a failed server contact.
    Extended,
}

impl CheckFamily {
    fn operation(self) -> &'static str {
        match self {
            Self::Single => "check_genuine",
            Self::Extended => "check_genuine_extended",
        }
    }
}

/// Maps a raw backend code into a [`GenuineOutcome`].
///
/// Pure and total over the documented code set for each family; the
/// extended family folds the deferred-retry code into `InternetError`.
/// An unrecognized code means the backend broke its contract and surfaces
/// as [`LicentiaError::BackendContractViolation`] rather than being mapped
/// silently.
pub fn classify(raw: i32, family: CheckFamily) -> LicentiaResult<GenuineOutcome> {
    match raw {
        code::OK => Ok(GenuineOutcome::Genuine),
        code::FAIL | code::REVOKED | code::MUST_ACTIVATE => Ok(GenuineOutcome::NotGenuine),
        code::INET => Ok(GenuineOutcome::InternetError),
        code::IN_VM => Ok(GenuineOutcome::NotGenuineInVM),
        code::FEATURES_CHANGED => Ok(GenuineOutcome::GenuineFeaturesChanged),
        code::INET_DELAYED if family == CheckFamily::Extended => {
            Ok(GenuineOutcome::InternetError)
        }
        other => Err(LicentiaError::BackendContractViolation {
            operation: family.operation(),
            code: other,
        }),
    }
}
