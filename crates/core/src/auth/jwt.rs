//! HS256 bearer-token authentication.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Lifetime of issued tokens.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(8 * 60 * 60);

/// Token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Validates `Authorization: Bearer <jwt>` headers signed with a shared secret.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token for a user, valid for [`TOKEN_LIFETIME`].
    pub fn issue_token(&self, user_id: &str, email: Option<&str>) -> Result<String, AuthError> {
        let claims = Claims {
            id: user_id.to_string(),
            email: email.map(str::to_string),
            exp: Utc::now().timestamp() + TOKEN_LIFETIME.as_secs() as i64,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigurationError(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = request.bearer_token().ok_or(AuthError::NotAuthenticated)?;
        let claims = self.verify(token)?;

        let mut extra = HashMap::new();
        if let Some(email) = claims.email {
            extra.insert("email".to_string(), serde_json::Value::String(email));
        }

        Ok(Identity {
            user_id: claims.id,
            method: "jwt".to_string(),
            claims: extra,
        })
    }

    fn method_name(&self) -> &'static str {
        "jwt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn request(token: Option<&str>) -> AuthRequest {
        let mut headers = HashMap::new();
        if let Some(token) = token {
            headers.insert("authorization".to_string(), format!("Bearer {}", token));
        }
        AuthRequest {
            headers,
            source_ip: IpAddr::from([127, 0, 0, 1]),
        }
    }

    #[tokio::test]
    async fn test_issued_token_authenticates() {
        let auth = JwtAuthenticator::new("secret");
        let token = auth.issue_token("user-1", Some("a@example.com")).unwrap();

        let identity = auth.authenticate(&request(Some(&token))).await.unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.method, "jwt");
        assert_eq!(
            identity.claims.get("email"),
            Some(&serde_json::json!("a@example.com"))
        );
    }

    #[tokio::test]
    async fn test_missing_token() {
        let auth = JwtAuthenticator::new("secret");
        let err = auth.authenticate(&request(None)).await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let issuer = JwtAuthenticator::new("one");
        let token = issuer.issue_token("user-1", None).unwrap();

        let auth = JwtAuthenticator::new("two");
        let err = auth.authenticate(&request(Some(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let auth = JwtAuthenticator::new("secret");
        let token = auth
            .sign(&Claims {
                id: "user-1".to_string(),
                email: None,
                exp: Utc::now().timestamp() - 3600,
            })
            .unwrap();

        let err = auth.authenticate(&request(Some(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let auth = JwtAuthenticator::new("secret");
        let err = auth
            .authenticate(&request(Some("not.a.jwt")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }
}
