use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::Claims;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("unknown key id {0:?}")]
    UnknownKey(String),
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token is outside its validity window")]
    Expired,
    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("signing token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("private key does not match the public key for key id {0:?}")]
    KeyMismatch(String),
}

/// Resolves a key id to the public key that verifies it.
pub trait KeyLookup: Send + Sync {
    fn public_key(&self, kid: &str) -> Option<DecodingKey>;
}

/// Fixed set of public keys known at startup.
#[derive(Clone, Default)]
pub struct StaticKeyLookup {
    keys: HashMap<String, DecodingKey>,
}

impl StaticKeyLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.keys.insert(kid.into(), key);
        self
    }
}

impl KeyLookup for StaticKeyLookup {
    fn public_key(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.get(kid).cloned()
    }
}

/// Issues and verifies RSA-signed tokens. The signing key id travels in the
/// token header so verification can pick the matching public key.
pub struct Authenticator {
    algorithm: Algorithm,
    kid: String,
    private_key: EncodingKey,
    lookup: Arc<dyn KeyLookup>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Build an authenticator and prove the private key pairs with the public
    /// key the lookup returns for `kid`. A mismatch is a configuration error.
    pub fn new(
        private_key: EncodingKey,
        kid: impl Into<String>,
        algorithm: &str,
        lookup: Arc<dyn KeyLookup>,
    ) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(algorithm)
            .ok()
            .filter(is_rsa)
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let authenticator = Self {
            algorithm,
            kid: kid.into(),
            private_key,
            lookup,
        };

        let probe = Claims::new("key-probe", Vec::new(), Utc::now(), Duration::minutes(1));
        let token = authenticator.generate_token(&probe)?;
        match authenticator.parse_claims(&token) {
            Ok(_) => Ok(authenticator),
            Err(AuthError::BadSignature) => Err(AuthError::KeyMismatch(authenticator.kid)),
            Err(err) => Err(err),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Sign `claims` into a compact token.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &self.private_key).map_err(AuthError::Signing)
    }

    /// Verify `token` and return its claims.
    pub fn parse_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;

        if header.alg != self.algorithm {
            return Err(AuthError::Malformed(format!("unexpected algorithm {:?}", header.alg)));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::Malformed("missing key id".to_string()))?;

        let key = self
            .lookup
            .public_key(&kid)
            .ok_or(AuthError::UnknownKey(kid))?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::Expired,
            _ => AuthError::Malformed(e.to_string()),
        })?;

        Ok(data.claims)
    }
}

fn is_rsa(algorithm: &Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ROLE_ADMIN, ROLE_USER};
    use crate::testing;

    fn roles() -> Vec<String> {
        vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()]
    }

    #[test]
    fn test_round_trip_preserves_subject_and_roles() {
        let auth = testing::authenticator();
        let claims = Claims::new("5cf37266-3473-4006-984f-9325122678b7", roles(), Utc::now(), Duration::hours(1));

        let token = auth.generate_token(&claims).unwrap();
        let parsed = auth.parse_claims(&token).unwrap();

        assert_eq!(parsed.sub, claims.sub);
        assert_eq!(parsed.roles, claims.roles);
        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_header_names_key_id() {
        let auth = testing::authenticator();
        let claims = Claims::new("42", roles(), Utc::now(), Duration::hours(1));
        let token = auth.generate_token(&claims).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(testing::KEY_ID));
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_rejects_token_signed_with_different_key() {
        let auth = testing::authenticator();
        let other = testing::other_authenticator();
        let claims = Claims::new("42", roles(), Utc::now(), Duration::hours(1));

        let token = other.generate_token(&claims).unwrap();
        assert!(matches!(auth.parse_claims(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn test_rejects_unknown_key_id() {
        let auth = testing::authenticator();
        let claims = Claims::new("42", roles(), Utc::now(), Duration::hours(1));

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("not-a-key".to_string());
        let token = encode(&header, &claims, &testing::private_key()).unwrap();

        assert!(matches!(auth.parse_claims(&token), Err(AuthError::UnknownKey(kid)) if kid == "not-a-key"));
    }

    #[test]
    fn test_rejects_expired_token() {
        let auth = testing::authenticator();
        let issued = Utc::now() - Duration::hours(2);
        let claims = Claims::new("42", roles(), issued, Duration::hours(1));

        let token = auth.generate_token(&claims).unwrap();
        assert!(matches!(auth.parse_claims(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_rejects_garbage() {
        let auth = testing::authenticator();

        assert!(matches!(auth.parse_claims("not.a.token"), Err(AuthError::Malformed(_))));
        assert!(matches!(auth.parse_claims(""), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_rejects_missing_key_id() {
        let auth = testing::authenticator();
        let claims = Claims::new("42", roles(), Utc::now(), Duration::hours(1));
        let token = encode(&Header::new(Algorithm::RS256), &claims, &testing::private_key()).unwrap();

        assert!(matches!(auth.parse_claims(&token), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_startup_detects_mismatched_keys() {
        let lookup = StaticKeyLookup::new().with_key(testing::KEY_ID, testing::other_public_key());
        let result = Authenticator::new(testing::private_key(), testing::KEY_ID, "RS256", Arc::new(lookup));

        assert!(matches!(result, Err(AuthError::KeyMismatch(_))));
    }

    #[test]
    fn test_startup_rejects_non_rsa_algorithm() {
        let lookup = StaticKeyLookup::new().with_key(testing::KEY_ID, testing::public_key());
        let result = Authenticator::new(testing::private_key(), testing::KEY_ID, "HS256", Arc::new(lookup));

        assert!(matches!(result, Err(AuthError::UnsupportedAlgorithm(_))));
    }
}
