//! Tests for user value types and the secure projection.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

#[fixture]
fn user() -> User {
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time");
    User::from(UserRecord {
        id: UserId::random(),
        email: Email::parse("Alice@Example.com").expect("valid email"),
        username: Username::parse("alice").expect("valid username"),
        password_hash: PasswordHash::new("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
        full_name: Some("Alice Example".into()),
        institution: None,
        tier: Tier::Free,
        role: Role::Member,
        is_active: true,
        created_at: at,
        updated_at: at,
    })
}

#[rstest]
fn email_is_normalised_on_parse(user: User) {
    assert_eq!(user.email().as_ref(), "alice@example.com");
}

#[rstest]
#[case("free", Tier::Free)]
#[case(" PRO ", Tier::Pro)]
#[case("Enterprise", Tier::Enterprise)]
fn tiers_parse_case_insensitively(#[case] raw: &str, #[case] expected: Tier) {
    assert_eq!(raw.parse::<Tier>().expect("known tier"), expected);
}

#[rstest]
#[case("platinum")]
#[case("")]
fn unknown_tiers_are_rejected(#[case] raw: &str) {
    let err = raw.parse::<Tier>().expect_err("unknown tier");
    assert_eq!(err.field(), "tier");
    assert_eq!(err.code(), ValidationCode::UnknownValue);
}

#[rstest]
fn password_hash_debug_output_is_redacted(user: User) {
    let rendered = format!("{user:?}");
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("argon2id"));
}

#[rstest]
fn secure_projection_omits_credentials(user: User) {
    let value = serde_json::to_value(SecureUser::from(&user)).expect("serialise user");
    let object = value.as_object().expect("json object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "createdAt",
            "email",
            "fullName",
            "id",
            "institution",
            "isActive",
            "tier",
            "updatedAt",
            "username",
        ]
    );
    assert_eq!(value["tier"], "free");
}

#[rstest]
fn with_changes_applies_only_present_fields(user: User) {
    let changes = UserChanges {
        full_name: Some(None),
        tier: Some(Tier::Pro),
        ..UserChanges::default()
    };
    let updated = user.with_changes(&changes);
    assert_eq!(updated.full_name(), None);
    assert_eq!(updated.tier(), Tier::Pro);
    assert_eq!(updated.institution(), user.institution());
    assert!(updated.is_active());
}

#[rstest]
fn empty_changes_report_empty() {
    assert!(UserChanges::default().is_empty());
    assert!(
        !UserChanges {
            is_active: Some(false),
            ..UserChanges::default()
        }
        .is_empty()
    );
}
