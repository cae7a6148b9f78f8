use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

mod authenticator;

pub use authenticator::{AuthError, Authenticator, KeyLookup, StaticKeyLookup};

/// Role granted to administrators.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Role every registered user carries.
pub const ROLE_USER: &str = "USER";

/// Identity and role set carried inside a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl Claims {
    /// Claims valid from `now` until `now + ttl`.
    pub fn new(subject: impl Into<String>, roles: Vec<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        // A negative ttl would yield exp < iat.
        let ttl = ttl.max(Duration::zero());

        Self {
            sub: subject.into(),
            roles,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: Some(now.timestamp()),
        }
    }

    /// True when any of `roles` is present.
    pub fn has_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|have| roles.iter().any(|want| have == want))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&[ROLE_ADMIN])
    }

    /// Admins may modify anything, everyone else only what they own.
    pub fn can_modify(&self, owner: &str) -> bool {
        self.is_admin() || self.sub == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_window() {
        let now = Utc::now();
        let claims = Claims::new("42", vec![ROLE_USER.to_string()], now, Duration::hours(1));

        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 3600);
        assert!(claims.exp >= claims.iat);
    }

    #[test]
    fn test_negative_ttl_is_clamped() {
        let claims = Claims::new("42", vec![], Utc::now(), Duration::hours(-1));
        assert_eq!(claims.exp, claims.iat);
    }

    #[test]
    fn test_has_role_any_of() {
        let claims = Claims::new(
            "42",
            vec![ROLE_USER.to_string(), "AUDITOR".to_string()],
            Utc::now(),
            Duration::hours(1),
        );

        assert!(claims.has_role(&[ROLE_ADMIN, "AUDITOR"]));
        assert!(!claims.has_role(&[ROLE_ADMIN]));
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_no_roles_grants_nothing() {
        let claims = Claims::new("42", vec![], Utc::now(), Duration::hours(1));

        assert!(!claims.has_role(&[ROLE_USER]));
        assert!(claims.can_modify("42"));
        assert!(!claims.can_modify("7"));
    }
}
