//! Shared test double for the verification backend.

#![allow(dead_code)]

use licentia::{
    code, ExpirationSink, GenuineOptions, LicenseHandle, TrialMode, VerificationBackend,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// The product identifier the mock recognizes.
pub const PRODUCT_ID: &str = "18324776654b3946fc44a5f3.49025204";

/// Scripted backend: pops pre-loaded raw codes per operation and records
/// what the engine asked for. Every unscripted check answers `OK`.
pub struct MockBackend {
    inner: Mutex<Inner>,
}

struct Inner {
    extended_codes: VecDeque<i32>,
    single_codes: VecDeque<i32>,
    activated: bool,
    use_trial_code: i32,
    trial_days: u32,
    extend_code: i32,
    extension_days: u32,
    activate_code: i32,
    deactivate_code: i32,
    product_key_code: i32,
    is_activated_code: Option<i32>,
    sink: Option<ExpirationSink>,
    use_trial_calls: u32,
    last_options: Option<GenuineOptions>,
    last_trial_mode: Option<TrialMode>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                extended_codes: VecDeque::new(),
                single_codes: VecDeque::new(),
                activated: false,
                use_trial_code: code::OK,
                trial_days: 0,
                extend_code: code::OK,
                extension_days: 0,
                activate_code: code::OK,
                deactivate_code: code::OK,
                product_key_code: code::OK,
                is_activated_code: None,
                sink: None,
                use_trial_calls: 0,
                last_options: None,
                last_trial_mode: None,
            }),
        }
    }

    // ── Scripting ────────────────────────────────────────────────

    pub fn push_extended(&self, raw: i32) {
        self.inner.lock().unwrap().extended_codes.push_back(raw);
    }

    pub fn push_single(&self, raw: i32) {
        self.inner.lock().unwrap().single_codes.push_back(raw);
    }

    pub fn set_activated(&self, activated: bool) {
        self.inner.lock().unwrap().activated = activated;
    }

    /// Overrides the `is_activated` answer with a raw code, bypassing the
    /// activated flag. For contract-violation tests.
    pub fn set_is_activated_code(&self, raw: i32) {
        self.inner.lock().unwrap().is_activated_code = Some(raw);
    }

    pub fn set_use_trial_code(&self, raw: i32) {
        self.inner.lock().unwrap().use_trial_code = raw;
    }

    pub fn set_trial_days(&self, days: u32) {
        self.inner.lock().unwrap().trial_days = days;
    }

    pub fn set_extend_code(&self, raw: i32) {
        self.inner.lock().unwrap().extend_code = raw;
    }

    /// Days granted on a successful extension.
    pub fn set_extension_days(&self, days: u32) {
        self.inner.lock().unwrap().extension_days = days;
    }

    pub fn set_activate_code(&self, raw: i32) {
        self.inner.lock().unwrap().activate_code = raw;
    }

    pub fn set_deactivate_code(&self, raw: i32) {
        self.inner.lock().unwrap().deactivate_code = raw;
    }

    pub fn set_product_key_code(&self, raw: i32) {
        self.inner.lock().unwrap().product_key_code = raw;
    }

    // ── Observations ─────────────────────────────────────────────

    /// The expiration sink captured from `use_trial`, for firing
    /// notifications from a test-controlled thread.
    pub fn captured_sink(&self) -> Option<ExpirationSink> {
        self.inner.lock().unwrap().sink.clone()
    }

    pub fn last_options(&self) -> Option<GenuineOptions> {
        self.inner.lock().unwrap().last_options
    }

    pub fn last_trial_mode(&self) -> Option<TrialMode> {
        self.inner.lock().unwrap().last_trial_mode
    }

    pub fn use_trial_calls(&self) -> u32 {
        self.inner.lock().unwrap().use_trial_calls
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationBackend for MockBackend {
    fn acquire_handle(&self, product_id: &str) -> Option<LicenseHandle> {
        if product_id == PRODUCT_ID {
            LicenseHandle::new(0x5eed)
        } else {
            None
        }
    }

    fn check_genuine(&self, _handle: LicenseHandle) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        inner.single_codes.pop_front().unwrap_or(code::OK)
    }

    fn check_genuine_extended(&self, _handle: LicenseHandle, options: &GenuineOptions) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        inner.last_options = Some(*options);
        inner.extended_codes.pop_front().unwrap_or(code::OK)
    }

    fn is_activated(&self, _handle: LicenseHandle) -> i32 {
        let inner = self.inner.lock().unwrap();
        if let Some(raw) = inner.is_activated_code {
            return raw;
        }
        if inner.activated { code::OK } else { code::FAIL }
    }

    fn use_trial(
        &self,
        _handle: LicenseHandle,
        mode: TrialMode,
        _extra_data: Option<&str>,
        notify: ExpirationSink,
    ) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        inner.use_trial_calls += 1;
        inner.last_trial_mode = Some(mode);
        inner.sink = Some(notify);
        inner.use_trial_code
    }

    fn trial_days_remaining(&self, _handle: LicenseHandle, _mode: TrialMode) -> u32 {
        self.inner.lock().unwrap().trial_days
    }

    fn extend_trial(&self, _handle: LicenseHandle, _mode: TrialMode, _code: &str) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if inner.extend_code == code::OK {
            inner.trial_days += inner.extension_days;
        }
        inner.extend_code
    }

    fn activate(&self, _handle: LicenseHandle, _extra_data: Option<&str>) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if inner.activate_code == code::OK {
            inner.activated = true;
        }
        inner.activate_code
    }

    fn deactivate(&self, _handle: LicenseHandle, _erase_product_key: bool) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        if inner.deactivate_code == code::OK {
            inner.activated = false;
        }
        inner.deactivate_code
    }

    fn check_and_save_product_key(&self, _handle: LicenseHandle, _key: &str) -> i32 {
        self.inner.lock().unwrap().product_key_code
    }
}
