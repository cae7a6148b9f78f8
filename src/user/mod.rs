//! Users, password hashing and token issuance.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::auth::{AuthError, Authenticator, Claims};
use crate::database::StoreError;
use crate::error::FieldError;
use crate::web::{Validate, Violations};

mod store;

pub use store::UserStore;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Unknown email and wrong password are deliberately the same error.
    #[error("Authentication failed")]
    AuthenticationFailure,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("password hashing: {0}")]
    Hash(String),
    #[error("generating token")]
    Token(#[from] AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub password: String,
    pub password_confirm: String,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Violations::new()
            .required("name", &self.name)
            .required("email", &self.email)
            .required_list("roles", &self.roles)
            .required("password", &self.password)
            .equal("password_confirm", &self.password_confirm, "password", &self.password)
            .finish()
    }
}

/// Token response of `GET /v1/users/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

pub async fn list(store: &dyn UserStore, deadline: Instant) -> Result<Vec<User>, UserError> {
    Ok(store.list_users(deadline).await?)
}

/// Store a new user with a hashed password.
pub async fn create(
    store: &dyn UserStore,
    new: NewUser,
    now: DateTime<Utc>,
    deadline: Instant,
) -> Result<User, UserError> {
    let password_hash = hash_password(new.password).await?;

    let user = User {
        id: Uuid::new_v4(),
        name: new.name,
        email: new.email,
        roles: new.roles,
        password_hash,
        date_created: now,
        date_updated: now,
    };

    store.insert_user(&user, deadline).await?;
    Ok(user)
}

/// Check `email` and `password`, returning the claims a token would carry.
pub async fn authenticate(
    store: &dyn UserStore,
    now: DateTime<Utc>,
    email: &str,
    password: &str,
    ttl: Duration,
    deadline: Instant,
) -> Result<Claims, UserError> {
    let user = store
        .fetch_user_by_email(email, deadline)
        .await?
        .ok_or(UserError::AuthenticationFailure)?;

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        return Err(UserError::AuthenticationFailure);
    }

    Ok(Claims::new(user.id.to_string(), user.roles, now, ttl))
}

/// Authenticate and sign a token for the caller.
pub async fn token(
    store: &dyn UserStore,
    authenticator: &Authenticator,
    now: DateTime<Utc>,
    email: &str,
    password: &str,
    ttl: Duration,
    deadline: Instant,
) -> Result<Token, UserError> {
    let claims = authenticate(store, now, email, password, ttl, deadline).await?;
    let token = authenticator.generate_token(&claims)?;
    Ok(Token { token })
}

/// Argon2 is CPU bound, so both directions run on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Hash(e.to_string()))
    })
    .await
    .map_err(|e| UserError::Hash(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, UserError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| UserError::Hash(e.to_string()))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| UserError::Hash(e.to_string()))?
}
