//! Authentication
//!
//! Verifies identity-provider bearer tokens and exposes the resulting
//! `UserIdentity` as an axum extractor. Token cryptography is delegated:
//! the verifier fetches the provider's published signing keys (JWKS),
//! caches them per their cache headers, and checks RS256 signatures with
//! the configured project id as audience.

use crate::errors::{AppError, Result};
use crate::services::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Authenticated caller identity
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
}

/// Trait for bearer-token verification
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserIdentity>;
}

#[derive(Deserialize)]
struct IdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Deserialize, Clone)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

struct KeyCache {
    keys: HashMap<String, Jwk>,
    expires_at: DateTime<Utc>,
}

/// Verifier backed by the identity provider's JWKS endpoint
pub struct JwksVerifier {
    client: reqwest::Client,
    jwks_url: String,
    audience: String,
    issuer: String,
    cache: RwLock<KeyCache>,
}

impl JwksVerifier {
    pub fn new(project_id: &str, jwks_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_url,
            audience: project_id.to_string(),
            issuer: format!("https://securetoken.google.com/{}", project_id),
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                expires_at: Utc::now(),
            }),
        }
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk> {
        {
            let cache = self.cache.read().await;
            if cache.expires_at > Utc::now() {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        self.refresh_keys().await?;

        let cache = self.cache.read().await;
        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated {
                message: "Unknown token signing key".to_string(),
            })
    }

    async fn refresh_keys(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                service: "identity-provider".to_string(),
                message: format!("Failed to fetch signing keys: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                service: "identity-provider".to_string(),
                message: format!("Signing key fetch returned HTTP {}", response.status()),
            });
        }

        let max_age = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(3600);

        let jwks: JwksResponse = response.json().await.map_err(|e| AppError::Upstream {
            service: "identity-provider".to_string(),
            message: format!("Malformed signing key response: {}", e),
        })?;

        let mut cache = self.cache.write().await;
        cache.keys = jwks.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        cache.expires_at = Utc::now() + Duration::seconds(max_age);
        Ok(())
    }
}

fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity> {
        let header = decode_header(token).map_err(|_| AppError::Unauthenticated {
            message: "Malformed token".to_string(),
        })?;

        let kid = header.kid.ok_or_else(|| AppError::Unauthenticated {
            message: "Token missing key id".to_string(),
        })?;

        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            AppError::Internal {
                message: format!("Invalid signing key material: {}", e),
            }
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<IdClaims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
            _ => AppError::Unauthenticated {
                message: "Invalid token".to_string(),
            },
        })?;

        Ok(UserIdentity {
            user_id: data.claims.sub,
            email: data.claims.email.unwrap_or_default(),
        })
    }
}

/// Verifier accepting a fixed set of tokens; tests and local development
pub struct StaticVerifier {
    identities: HashMap<String, UserIdentity>,
}

impl StaticVerifier {
    pub fn new(identities: HashMap<String, UserIdentity>) -> Self {
        Self { identities }
    }

    /// Parse the `token:user_id:email` form used in configuration
    pub fn from_spec(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(token), Some(user_id), Some(email)) if !token.is_empty() => {
                let mut identities = HashMap::new();
                identities.insert(
                    token.to_string(),
                    UserIdentity {
                        user_id: user_id.to_string(),
                        email: email.to_string(),
                    },
                );
                Ok(Self::new(identities))
            }
            _ => Err(AppError::Configuration {
                message: "auth.static_identity must be `token:user_id:email`".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated {
                message: "Invalid token".to_string(),
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for UserIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = bearer_token(header).ok_or_else(|| AppError::Unauthenticated {
            message: "Expected a bearer token".to_string(),
        })?;

        state.verifier.verify(token).await
    }
}
