//! Unit tests for token configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;

fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn strong_key() -> String {
    "s".repeat(SIGNING_KEY_MIN_LEN)
}

#[rstest]
#[case(BuildMode::Debug)]
#[case(BuildMode::Release)]
fn missing_key_fails_in_every_mode(#[case] mode: BuildMode) {
    let err = auth_settings_from_env(&mock_env(&[]), mode).expect_err("missing key");
    assert_eq!(
        err,
        AuthConfigError::MissingEnv {
            name: SIGNING_KEY_ENV
        }
    );
}

#[rstest]
fn empty_key_counts_as_missing() {
    let env = mock_env(&[(SIGNING_KEY_ENV, "")]);
    assert!(matches!(
        auth_settings_from_env(&env, BuildMode::Debug),
        Err(AuthConfigError::MissingEnv { .. })
    ));
}

#[rstest]
fn release_rejects_short_keys() {
    let env = mock_env(&[(SIGNING_KEY_ENV, "short")]);
    let err = auth_settings_from_env(&env, BuildMode::Release).expect_err("short key");
    assert_eq!(
        err,
        AuthConfigError::KeyTooShort {
            name: SIGNING_KEY_ENV,
            length: 5,
            min_len: SIGNING_KEY_MIN_LEN,
        }
    );
}

#[rstest]
fn debug_tolerates_short_keys() {
    let env = mock_env(&[(SIGNING_KEY_ENV, "short")]);
    let settings = auth_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.signing_key.expose(), b"short");
}

#[rstest]
#[case(BuildMode::Debug)]
#[case(BuildMode::Release)]
fn ttl_defaults_to_thirty_minutes(#[case] mode: BuildMode) {
    let key = strong_key();
    let env = mock_env(&[(SIGNING_KEY_ENV, key.as_str())]);
    let settings = auth_settings_from_env(&env, mode).expect("settings");
    assert_eq!(settings.token_ttl, Duration::minutes(30));
}

#[rstest]
#[case("0")]
#[case("1441")]
#[case("soon")]
fn release_rejects_out_of_range_ttls(#[case] ttl: &str) {
    let key = strong_key();
    let env = mock_env(&[(SIGNING_KEY_ENV, key.as_str()), (TOKEN_TTL_ENV, ttl)]);
    let err = auth_settings_from_env(&env, BuildMode::Release).expect_err("bad ttl");
    assert!(matches!(err, AuthConfigError::InvalidEnv { name, .. } if name == TOKEN_TTL_ENV));
}

#[rstest]
fn debug_falls_back_on_bad_ttls() {
    let key = strong_key();
    let env = mock_env(&[(SIGNING_KEY_ENV, key.as_str()), (TOKEN_TTL_ENV, "-4")]);
    let settings = auth_settings_from_env(&env, BuildMode::Debug).expect("settings");
    assert_eq!(settings.token_ttl, Duration::minutes(30));
}

#[rstest]
fn debug_output_never_shows_the_key() {
    let key = SigningKey::new(strong_key());
    let rendered = format!("{key:?}");
    assert!(!rendered.contains(&strong_key()));
    assert!(rendered.contains(&key.fingerprint()));
}

#[rstest]
fn fingerprints_distinguish_keys() {
    let first = SigningKey::new(vec![b'a'; 32]).fingerprint();
    let second = SigningKey::new(vec![b'b'; 32]).fingerprint();
    assert_ne!(first, second);
    assert_eq!(first, first.to_lowercase());
}
