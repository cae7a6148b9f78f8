//! Test utilities: fixed RSA key pairs and an in-memory store.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::auth::{Authenticator, StaticKeyLookup};

mod memory;

pub use memory::MemoryStore;

/// Key id the fixture key pair is published under.
pub const KEY_ID: &str = "4754d86b-7a6d-4df5-9c65-224741361492";

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/public.pem");
const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("fixtures/other_private.pem");
const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("fixtures/other_public.pem");

pub fn private_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(PRIVATE_PEM).expect("fixture private key")
}

pub fn public_key() -> DecodingKey {
    DecodingKey::from_rsa_pem(PUBLIC_PEM).expect("fixture public key")
}

pub fn other_private_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(OTHER_PRIVATE_PEM).expect("fixture private key")
}

pub fn other_public_key() -> DecodingKey {
    DecodingKey::from_rsa_pem(OTHER_PUBLIC_PEM).expect("fixture public key")
}

/// Authenticator over the fixture key pair.
pub fn authenticator() -> Authenticator {
    let lookup = StaticKeyLookup::new().with_key(KEY_ID, public_key());
    Authenticator::new(private_key(), KEY_ID, "RS256", Arc::new(lookup)).expect("fixture authenticator")
}

/// Signs under the same key id with an unrelated key pair.
pub fn other_authenticator() -> Authenticator {
    let lookup = StaticKeyLookup::new().with_key(KEY_ID, other_public_key());
    Authenticator::new(other_private_key(), KEY_ID, "RS256", Arc::new(lookup))
        .expect("fixture authenticator")
}
