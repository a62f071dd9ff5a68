use crate::schemas::UserRef;
use actix_web::{http::header::HeaderValue, HttpRequest};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::{env, num::ParseIntError};

type HmacSha256 = Hmac<Sha256>;

/// Identity payload the app attaches to the `Authorization` header after
/// signing in: the signed-in user plus an HMAC of the fields, keyed off the
/// shared `APP_AUTH_SECRET`.
#[derive(Deserialize, Debug, Clone)]
struct SignedAuthData {
    auth_date: String,
    id: String,
    name: String,
    hash: String,
}

/// Resolves the current user from the request, or `None` when the header is
/// missing or its signature does not verify. Operations that need a
/// submitter treat `None` as an unresolved identity, not as an anonymous
/// user.
pub fn resolve_current_user(request: &HttpRequest) -> Option<UserRef> {
    let authorization = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    let secret = env::var("APP_AUTH_SECRET").ok()?;
    let auth_data: SignedAuthData = serde_json::from_str(authorization).ok()?;
    let hash = auth_data
        .hash
        .chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|n| u8::from_str_radix(&String::from_iter(n), 16))
        .collect::<Result<Vec<u8>, ParseIntError>>()
        .ok()?;
    let computed_hash = compute_hash(&auth_data, &secret);
    if computed_hash == hash {
        Some(UserRef {
            id: auth_data.id,
            name: auth_data.name,
        })
    } else {
        None
    }
}

fn compute_hash(auth_data: &SignedAuthData, secret: &str) -> Vec<u8> {
    let hash_content = [
        ("auth_date", &auth_data.auth_date),
        ("id", &auth_data.id),
        ("name", &auth_data.name),
    ]
    .into_iter()
    .map(|(field, value)| format!("{}={}", field, value))
    .collect::<Vec<_>>()
    .join("\n");

    let mut sha256_hasher = Sha256::new();
    sha256_hasher.update(secret.as_bytes());
    let secret_hash = sha256_hasher.finalize();

    let mut hmac_hasher =
        HmacSha256::new_from_slice(&secret_hash).expect("hmac accepts any key length");
    hmac_hasher.update(hash_content.as_bytes());
    hmac_hasher.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::test::TestRequest;

    fn signed_header(id: &str, name: &str, secret: &str) -> String {
        let mut data = SignedAuthData {
            auth_date: "1732000000".to_string(),
            id: id.to_string(),
            name: name.to_string(),
            hash: String::new(),
        };
        data.hash = compute_hash(&data, secret)
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        format!(
            r#"{{"auth_date":"{}","id":"{}","name":"{}","hash":"{}"}}"#,
            data.auth_date, data.id, data.name, data.hash
        )
    }

    #[test]
    fn accepts_a_correctly_signed_user() {
        env::set_var("APP_AUTH_SECRET", "test-secret");
        let request = TestRequest::default()
            .insert_header((header::AUTHORIZATION, signed_header("u1", "Ana", "test-secret")))
            .to_http_request();

        let user = resolve_current_user(&request).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ana");
    }

    #[test]
    fn rejects_a_tampered_signature() {
        env::set_var("APP_AUTH_SECRET", "test-secret");
        let request = TestRequest::default()
            .insert_header((
                header::AUTHORIZATION,
                signed_header("u1", "Ana", "other-secret"),
            ))
            .to_http_request();

        assert!(resolve_current_user(&request).is_none());
    }

    #[test]
    fn missing_header_yields_no_user() {
        env::set_var("APP_AUTH_SECRET", "test-secret");
        let request = TestRequest::default().to_http_request();
        assert!(resolve_current_user(&request).is_none());
    }
}
