use axum::http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

/// Claims of tokens issued by the external account service; this crate only
/// verifies and reads them.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) => Ok(token.claims.sub),
        Err(_) => Err(HttpError::new(
            ErrorMessage::InvalidToken.to_string(),
            StatusCode::UNAUTHORIZED,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn issue_token(subject: &str, secret: &[u8], expires_in_minutes: i64) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let user_id = Uuid::new_v4().to_string();
        let secret = b"test-secret";

        let token = issue_token(&user_id, secret, 60);
        let subject = decode_token(token, secret).unwrap();

        assert_eq!(subject, user_id);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_token("abc", b"secret-a", 60);
        let err = decode_token(token, b"secret-b").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let token = issue_token("abc", b"test-secret", -10);
        let err = decode_token(token, b"test-secret").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
