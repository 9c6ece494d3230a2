//! Signed bearer tokens.
//!
//! A token is `base64url(payload).base64url(hmac)` where the payload is the
//! JSON object `{"id": <user uuid>, "exp": <unix seconds>}` and the MAC is
//! HMAC-SHA256 over the encoded payload.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::{Result, ShopError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: Uuid,
    exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    secret: SecretString,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: SecretString, ttl_days: i64) -> Self {
        Self { secret, ttl: Duration::days(ttl_days) }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| ShopError::Internal(format!("token key: {e}")))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims { id: user_id, exp: (now + self.ttl).timestamp() };
        let payload = serde_json::to_vec(&claims).map_err(|e| ShopError::Internal(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid> {
        let (payload, signature) = token.split_once('.').ok_or(ShopError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| ShopError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| ShopError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| ShopError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| ShopError::InvalidToken)?;
        if claims.exp <= now.timestamp() {
            return Err(ShopError::InvalidToken);
        }
        Ok(claims.id)
    }
}
