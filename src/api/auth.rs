use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Claims of an access token issued by the hosted auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id (uuid)
    pub exp: usize,  // expiry
    #[serde(default)]
    pub iat: usize, // issued at
    #[serde(default)]
    pub role: Option<String>,
}

pub fn extract_user_from_token(token: &str, secret: &str) -> Result<Uuid> {
    let mut validation = Validation::default();
    validation.validate_aud = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    if token_data.claims.role.as_deref() == Some("anon") {
        return Err(AppError::AuthError("Anonymous tokens cannot be used here".to_string()));
    }

    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthError("Token subject is not a user id".to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_test_secret_test_secret";

    pub(crate) fn issue_token(sub: &str, role: Option<&str>, ttl: Duration, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            role: role.map(str::to_string),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_user_id() {
        let user = Uuid::new_v4();
        let token = issue_token(&user.to_string(), Some("authenticated"), Duration::hours(1), SECRET);
        assert_eq!(extract_user_from_token(&token, SECRET).unwrap(), user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&Uuid::new_v4().to_string(), None, Duration::hours(-2), SECRET);
        assert!(matches!(
            extract_user_from_token(&token, SECRET),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&Uuid::new_v4().to_string(), None, Duration::hours(1), SECRET);
        assert!(extract_user_from_token(&token, "another_secret_another_secret").is_err());
    }

    #[test]
    fn anon_role_and_bad_subject_are_rejected() {
        let token = issue_token(&Uuid::new_v4().to_string(), Some("anon"), Duration::hours(1), SECRET);
        assert!(extract_user_from_token(&token, SECRET).is_err());

        let token = issue_token("0xabc", None, Duration::hours(1), SECRET);
        assert!(extract_user_from_token(&token, SECRET).is_err());
    }
}
