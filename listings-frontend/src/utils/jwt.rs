use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    /// Numeric or string user id set by the upstream's local strategy.
    #[serde(rename = "userId", default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl JwtClaims {
    /// The user identifier carried by the token.
    ///
    /// `userId` wins; otherwise `sub`, unless it is the `anonymous` placeholder.
    pub fn subject(&self) -> Option<String> {
        let from_user_id = match &self.user_id {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        from_user_id.or_else(|| {
            self.sub
                .as_deref()
                .filter(|sub| !sub.is_empty() && *sub != "anonymous")
                .map(str::to_string)
        })
    }

    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_unix)
    }
}

/// Decode JWT claims without validation
///
/// The upstream API issued the token and is the only party that checks its
/// signature; this side only reads the user id and expiry out of it.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let mut parts = token.split('.');

    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    };

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}
