use licentia::{LicentiaError, ReconcilePolicy};
use pretty_assertions::assert_eq;

#[test]
fn defaults_carry_vendor_recommendation() {
    let policy = ReconcilePolicy::default();
    assert_eq!(policy.days_between_checks, 90);
    assert_eq!(policy.grace_period_days, 14);
    assert!(!policy.skip_offline);
    assert!(!policy.show_inet_error_offline);
}

#[test]
fn default_policy_validates() {
    assert!(ReconcilePolicy::default().validate().is_ok());
}

#[test]
fn zero_grace_period_is_allowed() {
    let policy = ReconcilePolicy {
        grace_period_days: 0,
        ..ReconcilePolicy::default()
    };
    assert!(policy.validate().is_ok());
}

#[test]
fn zero_days_between_checks_is_rejected() {
    let policy = ReconcilePolicy {
        days_between_checks: 0,
        ..ReconcilePolicy::default()
    };
    assert!(matches!(
        policy.validate(),
        Err(LicentiaError::PolicyInvalid(_))
    ));
}

#[test]
fn policy_round_trips_through_json() {
    let policy = ReconcilePolicy {
        days_between_checks: 30,
        grace_period_days: 7,
        skip_offline: true,
        show_inet_error_offline: true,
    };
    let json = serde_json::to_string(&policy).unwrap();
    let back: ReconcilePolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(policy, back);
}
