use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, Identity};

/// Claims
///
/// Payload expected inside a bearer token. Tokens are issued elsewhere; this
/// service only checks them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the UUID of the user's `profiles` row.
    pub sub: Uuid,
    /// Expiration time, seconds since the epoch.
    pub exp: u64,
    /// Issued at, seconds since the epoch.
    pub iat: u64,
}

/// CredentialVerifier
///
/// Turns an opaque token into an [`Identity`]. Implementations must be free of
/// side effects and report every failure as [`AuthError::InvalidCredential`].
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Shared handle used by the guard and the login handler.
pub type VerifierState = Arc<dyn CredentialVerifier>;

/// JwtVerifier
///
/// HS256 verification against the configured shared secret. Expiry is always enforced.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(Identity::new(data.claims.sub)),
            Err(e) => {
                // The kind is useful when debugging clients but never goes back to them.
                tracing::debug!(kind = ?e.kind(), "bearer token rejected");
                Err(AuthError::InvalidCredential)
            }
        }
    }
}
