use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Verification material for bearer tokens, built once from the configured secret.
#[derive(Clone)]
pub struct AuthKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn verify(&self, token: &str) -> Option<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
        let id = Uuid::parse_str(&data.claims.sub).ok()?;
        Some(AuthUser {
            id,
            role: data.claims.role,
        })
    }
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Option<String>,
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Attaches an [`AuthUser`] when the request carries a valid bearer token.
/// Requests without an `Authorization` header pass through anonymously;
/// a header that is present but invalid is rejected.
pub async fn authenticate(State(keys): State<AuthKeys>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return next.run(req).await;
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };
    match keys.verify(token.trim()) {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => unauthorized("invalid_token"),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Authentication required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp: usize) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
            role: Some("professional".into()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn verifies_subject_as_user_id() {
        let keys = AuthKeys::new("secret");
        let id = Uuid::new_v4();
        let user = keys.verify(&token("secret", &id.to_string(), in_an_hour())).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role.as_deref(), Some("professional"));
    }

    #[test]
    fn rejects_wrong_secret_expired_and_non_uuid_subjects() {
        let keys = AuthKeys::new("secret");
        let id = Uuid::new_v4().to_string();
        assert!(keys.verify(&token("other", &id, in_an_hour())).is_none());
        assert!(keys.verify(&token("secret", &id, 1_000)).is_none());
        assert!(keys.verify(&token("secret", "not-a-uuid", in_an_hour())).is_none());
    }
}
