use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;

use super::{Request, Validate};
use crate::error::Error;

/// Request bodies larger than this are rejected.
const MAX_BODY_BYTES: usize = 1 << 20;

/// Read a JSON body into `T` and run its field validation.
pub async fn decode<T>(req: Request) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| Error::bad_request(format!("reading request body: {e}")))?;

    let value: T = serde_json::from_slice(&bytes).map_err(|e| Error::bad_request(e.to_string()))?;
    value.validate().map_err(Error::Validation)?;

    Ok(value)
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = authorization(headers)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Email and password from an `Authorization: Basic <base64>` header.
pub fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let (scheme, encoded) = authorization(headers)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Peer address attached by the server, `-` when unknown.
pub fn remote_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn authorization(headers: &HeaderMap) -> Option<(&str, &str)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, rest) = value.trim().split_once(' ')?;
    Some((scheme, rest.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::Violations;
    use crate::error::FieldError;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        #[serde(default)]
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Violations::new().required("name", &self.name).finish()
        }
    }

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer a b")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_basic_auth() {
        // admin@example.com:gophers
        let creds = basic_auth(&headers("Basic YWRtaW5AZXhhbXBsZS5jb206Z29waGVycw=="));
        assert_eq!(creds, Some(("admin@example.com".to_string(), "gophers".to_string())));

        assert_eq!(basic_auth(&headers("Basic !!!")), None);
        assert_eq!(basic_auth(&headers("Bearer YWRtaW4=")), None);
    }

    #[tokio::test]
    async fn test_decode_validates() {
        let req = Request::new(Body::from("{}"));
        let err = decode::<Named>(req).await.unwrap_err();
        assert!(matches!(err, Error::Validation(fields) if fields[0].field == "name"));

        let req = Request::new(Body::from(r#"{"name":"Dine"}"#));
        assert_eq!(decode::<Named>(req).await.unwrap().name, "Dine");
    }

    #[tokio::test]
    async fn test_decode_rejects_bad_json() {
        let req = Request::new(Body::from("{"));
        assert!(matches!(decode::<Named>(req).await, Err(Error::BadRequest(_))));
    }
}
