use super::model::{AccessClaims, AuthenticatedUser};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Verifies HS256 access tokens minted by the identity provider.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Rejected access token: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })?;

        let claims = token_data.claims;
        Ok(AuthenticatedUser::new(claims.user_id, claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn token_for(user_id: Uuid, role: Role, exp: u64, secret: &str) -> String {
        let claims = AccessClaims { user_id, role, exp };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, Role::ChiefAdmin, future_exp(), SECRET);

        let user = validator.validate_token(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::ChiefAdmin);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let token = token_for(Uuid::new_v4(), Role::Student, future_exp(), "other");

        assert!(matches!(
            validator.validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let exp = (chrono::Utc::now().timestamp() - 3600) as u64;
        let token = token_for(Uuid::new_v4(), Role::Student, exp, SECRET);

        assert!(validator.validate_token(&token).is_err());
    }
}
