//! Argon2id implementation of the `PasswordHasher` port.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use rand::rngs::OsRng;
use tracing::warn;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordHash};

/// PHC string with the default Argon2id cost parameters whose digest matches
/// no password.
const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Argon2id hasher with the crate's default cost parameters. Every call to
/// [`PasswordHasher::hash_password`] draws a fresh salt from the OS.
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|phc| PasswordHash::new(phc.to_string()))
            .map_err(|err| PasswordHashError::hashing(err.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &PasswordHash) -> bool {
        let parsed = match PhcString::new(hash.as_str()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn decoy_hash(&self) -> PasswordHash {
        PasswordHash::new(DECOY_HASH)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new()
    }

    fn password(raw: &str) -> Password {
        Password::new(raw).expect("valid password")
    }

    #[rstest]
    fn hashes_are_argon2id_phc_strings(hasher: Argon2PasswordHasher) {
        let hash = hasher
            .hash_password(&password("correct horse"))
            .expect("hashed");
        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(!hash.as_str().contains("correct horse"));
    }

    #[rstest]
    fn salts_differ_between_calls(hasher: Argon2PasswordHasher) {
        let first = hasher.hash_password(&password("Passw0rd!")).expect("hashed");
        let second = hasher.hash_password(&password("Passw0rd!")).expect("hashed");
        assert_ne!(first, second);
    }

    #[rstest]
    #[case("Passw0rd!", true)]
    #[case("passw0rd!", false)]
    #[case("", false)]
    fn verification_matches_only_the_original(
        hasher: Argon2PasswordHasher,
        #[case] attempt: &str,
        #[case] expected: bool,
    ) {
        let hash = hasher.hash_password(&password("Passw0rd!")).expect("hashed");
        assert_eq!(hasher.verify_password(attempt, &hash), expected);
    }

    #[rstest]
    #[case("")]
    #[case("plaintext")]
    #[case("$argon2id$v=19$broken")]
    fn malformed_hashes_never_verify(hasher: Argon2PasswordHasher, #[case] stored: &str) {
        assert!(!hasher.verify_password("anything", &PasswordHash::new(stored)));
    }

    #[rstest]
    fn decoy_costs_as_much_as_a_real_hash(hasher: Argon2PasswordHasher) {
        let decoy = hasher.decoy_hash();
        let parsed = PhcString::new(decoy.as_str()).expect("decoy parses");
        let params = argon2::Params::try_from(&parsed).expect("decoy params");
        let defaults = argon2::Params::default();

        assert_eq!(parsed.algorithm, argon2::Algorithm::Argon2id.ident());
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());
    }

    #[rstest]
    #[case("")]
    #[case("Passw0rd!")]
    #[case("somesaltsomesalt")]
    fn decoy_never_verifies(hasher: Argon2PasswordHasher, #[case] attempt: &str) {
        assert!(!hasher.verify_password(attempt, &hasher.decoy_hash()));
    }
}
