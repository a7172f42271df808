//! HS256 JWT implementation of the `SessionTokens` port.
//!
//! Tokens carry `sub` (user id), `iat`, and `exp`. Expiry is checked against
//! the caller's clock with zero leeway rather than the library's wall clock,
//! so tests can pin time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{IssuedToken, SessionTokens, TokenError};
use crate::domain::{AccessToken, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 access tokens with a shared secret.
#[derive(Clone)]
pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSessionTokens {
    /// Build an issuer/verifier from raw key bytes. Key length policy is
    /// enforced by configuration loading.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

fn map_decode_error(err: &jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::invalid_signature(),
        ErrorKind::ExpiredSignature => TokenError::expired(),
        _ => TokenError::malformed(),
    }
}

impl SessionTokens for JwtSessionTokens {
    fn create_access_token(
        &self,
        user_id: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken {
            token: AccessToken::new(token),
            expires_in: self.ttl.num_seconds(),
        })
    }

    fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| map_decode_error(&err))?;
        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::expired());
        }
        Uuid::parse_str(&data.claims.sub)
            .map(UserId::from_uuid)
            .map_err(|_| TokenError::invalid_subject())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[fixture]
    fn tokens() -> JwtSessionTokens {
        JwtSessionTokens::new(SECRET, Duration::minutes(30))
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn forged(claims: &Claims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("encoded")
    }

    #[rstest]
    fn issued_tokens_verify_to_their_subject(tokens: JwtSessionTokens) {
        let user = UserId::random();
        let issued = tokens
            .create_access_token(&user, issued_at())
            .expect("issued");
        assert_eq!(issued.expires_in, 1800);
        let verified = tokens
            .verify_token(issued.token.as_str(), issued_at() + Duration::minutes(29))
            .expect("valid");
        assert_eq!(verified, user);
    }

    #[rstest]
    #[case(Duration::minutes(30))]
    #[case(Duration::hours(2))]
    fn expiry_has_no_leeway(tokens: JwtSessionTokens, #[case] elapsed: Duration) {
        let issued = tokens
            .create_access_token(&UserId::random(), issued_at())
            .expect("issued");
        let err = tokens
            .verify_token(issued.token.as_str(), issued_at() + elapsed)
            .expect_err("expired");
        assert_eq!(err, TokenError::expired());
    }

    #[rstest]
    fn foreign_signatures_are_rejected(tokens: JwtSessionTokens) {
        let claims = Claims {
            sub: UserId::random().to_string(),
            iat: issued_at().timestamp(),
            exp: (issued_at() + Duration::minutes(30)).timestamp(),
        };
        let token = forged(&claims, b"another-secret-another-secret-xx");
        assert_eq!(
            tokens.verify_token(&token, issued_at()),
            Err(TokenError::invalid_signature())
        );
    }

    #[rstest]
    fn non_uuid_subjects_are_rejected(tokens: JwtSessionTokens) {
        let claims = Claims {
            sub: "admin".to_owned(),
            iat: issued_at().timestamp(),
            exp: (issued_at() + Duration::minutes(30)).timestamp(),
        };
        assert_eq!(
            tokens.verify_token(&forged(&claims, SECRET), issued_at()),
            Err(TokenError::invalid_subject())
        );
    }

    #[rstest]
    #[case("")]
    #[case("not-a-token")]
    #[case("a.b.c")]
    fn garbage_is_malformed(tokens: JwtSessionTokens, #[case] token: &str) {
        assert_eq!(
            tokens.verify_token(token, issued_at()),
            Err(TokenError::malformed())
        );
    }
}
